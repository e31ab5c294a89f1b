//! CLI for deriving, converting and inspecting extended keys.

mod cli;
mod config;
mod handlers;

use anyhow::{Error, Result};
use clap::Parser;
use hdkeys_common::logging::{self, LoggerConfig};

use crate::config::Config;

fn main() -> Result<(), Error> {
    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    let mut logger_config = LoggerConfig::new("hdkeys-cli".to_string());
    logger_config.set_options(config.logging);
    logging::init(logger_config);

    let network = cli.network.unwrap_or(config.network);
    let derive_config = config.derive_config();

    match cli.command {
        cli::Commands::Master(args) => handlers::handle_master(args, network),
        cli::Commands::Derive(args) => handlers::handle_derive(args, network, &derive_config),
        cli::Commands::Neuter(args) => handlers::handle_neuter(args),
        cli::Commands::Inspect(args) => handlers::handle_inspect(args),
    }
}
