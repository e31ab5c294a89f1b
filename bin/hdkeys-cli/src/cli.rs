use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hdkeys_key_deriv::Network;

#[derive(Parser, Debug)]
#[command(
    name = "hdkeys-cli",
    about = "Hierarchical deterministic key derivation for secp256k1",
    version
)]
pub(crate) struct Cli {
    #[arg(long, global = true, env = "HDKEYS_CONFIG", help = "the path to the config file")]
    pub(crate) config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "HDKEYS_NETWORK",
        help = "network of new keys (bitcoin or testnet), overrides the config file"
    )]
    pub(crate) network: Option<Network>,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Commands {
    Master(MasterArgs),

    Derive(DeriveArgs),

    Neuter(NeuterArgs),

    Inspect(InspectArgs),
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Print the master key of a seed", version)]
pub(crate) struct MasterArgs {
    #[arg(long, env = "HDKEYS_SEED", help = "the seed as hex")]
    pub(crate) seed: String,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Derive a key along a path", version)]
pub(crate) struct DeriveArgs {
    #[arg(
        long,
        env = "HDKEYS_SEED",
        conflicts_with = "key",
        required_unless_present = "key",
        help = "the seed as hex, the path starts at its master key"
    )]
    pub(crate) seed: Option<String>,

    #[arg(long, help = "the extended key the path starts at (xprv, xpub, tprv or tpub)")]
    pub(crate) key: Option<String>,

    #[arg(long, default_value = "m", help = "the derivation path, e.g. m/44'/0'/0'")]
    pub(crate) path: String,

    #[arg(long, help = "print the public form of the derived key")]
    pub(crate) public: bool,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Print the public form of an extended key", version)]
pub(crate) struct NeuterArgs {
    #[arg(help = "the extended key")]
    pub(crate) key: String,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Print the fields of an extended key", version)]
pub(crate) struct InspectArgs {
    #[arg(help = "the extended key")]
    pub(crate) key: String,
}
