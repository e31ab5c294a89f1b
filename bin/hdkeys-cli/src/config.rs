use std::{fs, path::Path};

use anyhow::anyhow;
use hdkeys_common::logging::LogOptions;
use hdkeys_key_deriv::{DeriveConfig, Network, RetryPolicy};
use serde::Deserialize;

/// Contents of the TOML config file.
///
/// ```toml
/// network = "testnet"
/// retry = "skip_invalid"
///
/// [logging]
/// with_file = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) network: Network,

    #[serde(default)]
    pub(crate) retry: RetryPolicy,

    #[serde(default)]
    pub(crate) logging: LogOptions,
}

impl Config {
    pub(crate) fn from_path(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| anyhow!(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    pub(crate) const fn derive_config(&self) -> DeriveConfig {
        DeriveConfig::new(self.retry)
    }
}
