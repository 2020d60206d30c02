use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::Level;

use data_escrow::crypto::{signature::SignatureMethod, MasterKey};

use crate::EscrowAgentError;

/// Agent configuration with all fields ready to use.
#[derive(Clone)]
pub struct Config {
    /// Base URL request signatures commit to; endpoint paths from
    /// [`data_escrow::constants::services`] are appended to it.
    pub base_url: String,
    pub master_key: MasterKey,
    pub signature_method: SignatureMethod,
    /// Allowed difference between a request timestamp and the current time.
    pub timestamp_window: Duration,
    /// Lifetime of a freshly minted request token.
    pub token_validity: Duration,
    /// Lifetime of a provisioned escrow key.
    pub key_validity: Duration,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(
        config_path: impl AsRef<Path>,
        master_key_bytes: Option<Vec<u8>>,
    ) -> Result<Self, EscrowAgentError> {
        let config_string = std::fs::read_to_string(config_path)?;
        let config_file = ConfigFile::from_str(&config_string)?;
        Self::from_config_file(config_file, master_key_bytes)
    }

    pub fn from_config_file(
        config: ConfigFile,
        master_key_bytes: Option<Vec<u8>>,
    ) -> Result<Self, EscrowAgentError> {
        let master_key = config.master_key_config(master_key_bytes)?;
        Ok(Self {
            base_url: config.base_url,
            master_key,
            signature_method: config.signature_method,
            timestamp_window: config.timestamp_window,
            token_validity: config.token_validity,
            key_validity: config.key_validity,
            logging: config.logging,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("signature_method", &self.signature_method)
            .field("timestamp_window", &self.timestamp_window)
            .field("token_validity", &self.token_validity)
            .field("key_validity", &self.key_validity)
            .field("logging", &self.logging)
            .finish()
    }
}

/// Agent configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
#[non_exhaustive]
pub struct ConfigFile {
    pub base_url: String,
    /// The master key can be provided as a file or passed to the [`Config`]
    /// constructors.
    pub master_key: Option<PathBuf>,
    #[serde(default)]
    pub signature_method: SignatureMethod,
    #[serde(with = "humantime_serde", default = "defaults::timestamp_window")]
    pub timestamp_window: Duration,
    #[serde(with = "humantime_serde", default = "defaults::token_validity")]
    pub token_validity: Duration,
    #[serde(with = "humantime_serde", default = "defaults::key_validity")]
    pub key_validity: Duration,
    pub logging: LoggingConfig,
}

impl FromStr for ConfigFile {
    type Err = EscrowAgentError;

    fn from_str(config_string: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(config_string)?)
    }
}

impl ConfigFile {
    pub fn master_key_config(
        &self,
        master_key_bytes: Option<Vec<u8>>,
    ) -> Result<MasterKey, EscrowAgentError> {
        let material = if let Some(bytes) = master_key_bytes {
            bytes
        } else if let Some(key_path) = &self.master_key {
            std::fs::read(key_path)?
        } else {
            return Err(EscrowAgentError::MasterKeyMissing);
        };

        Ok(MasterKey::try_from(material.as_slice())?)
    }
}

mod defaults {
    use std::time::Duration;

    pub fn timestamp_window() -> Duration {
        Duration::from_secs(5 * 60)
    }

    pub fn token_validity() -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    pub fn key_validity() -> Duration {
        // Two years.
        Duration::from_secs(2 * 365 * 24 * 60 * 60)
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct LoggingConfig {
    #[serde_as(as = "DisplayFromStr")]
    pub stdout_log_level: Level,
}
