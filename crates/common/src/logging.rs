//! Provides utilities to initialize logging.
use std::env;

use serde::Deserialize;
use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Environment variable name for the service label, which is appended to the
/// whoami string.
pub const SVC_LABEL_ENVVAR: &str = "HDKEYS_SVC_LABEL";

/// Logging knobs that can be set from a configuration file.
///
/// Both fall back to the `LOG_FILE=1` and `LOG_LINE_NUM=1` environment variables when unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LogOptions {
    /// Include the source file in each event.
    #[serde(default)]
    pub with_file: Option<bool>,

    /// Include the source line number in each event.
    #[serde(default)]
    pub with_line_number: Option<bool>,
}

/// Configuration for the logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// The whoami string, which is used to identify the service in logs.
    whoami: String,

    /// Source location toggles.
    options: LogOptions,
}

impl LoggerConfig {
    /// Creates a new instance with whoami set and default options.
    pub const fn new(whoami: String) -> Self {
        Self {
            whoami,
            options: LogOptions {
                with_file: None,
                with_line_number: None,
            },
        }
    }

    /// Creates a new instance with the whoami string set to the provided
    /// string.
    pub fn with_base_name(s: &str) -> Self {
        Self::new(get_whoami_string(s))
    }

    /// Sets the source location toggles.
    pub fn set_options(&mut self, options: LogOptions) {
        self.options = options;
    }

    /// The whoami string.
    pub fn whoami(&self) -> &str {
        &self.whoami
    }

    /// Whether events carry the source file.
    pub fn log_file(&self) -> bool {
        self.options
            .with_file
            .unwrap_or_else(|| env_flag("LOG_FILE"))
    }

    /// Whether events carry the source line number.
    pub fn log_line_num(&self) -> bool {
        self.options
            .with_line_number
            .unwrap_or_else(|| env_flag("LOG_LINE_NUM"))
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::with_base_name("(hdkeys)")
    }
}

/// Initializes the logging subsystem with the provided config.
///
/// Filtering follows `RUST_LOG`.
pub fn init(config: LoggerConfig) {
    let filt = tracing_subscriber::EnvFilter::from_default_env();

    // Stderr logging, stdout is left to command output.
    let stderr_sub = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .event_format(
            tracing_subscriber::fmt::format()
                .with_file(config.log_file())
                .with_line_number(config.log_line_num()),
        )
        .with_filter(filt);

    tracing_subscriber::registry().with(stderr_sub).init();

    info!(whoami = %config.whoami, "logging started");
}

/// Gets the service label from the standard envvar, which should be included
/// in the whoami string.
pub fn get_service_label_from_env() -> Option<String> {
    env::var(SVC_LABEL_ENVVAR).ok()
}

/// Computes a standard whoami string.
pub fn get_whoami_string(base: &str) -> String {
    match get_service_label_from_env() {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).is_ok_and(|v| v == "1")
}
