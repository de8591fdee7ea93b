//! Deployment configuration
//!
//! Loaded from TOML, then overridden from `MINTGATE_*` environment variables.

use crate::Amount;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Path to a TOML file read by [`MintgateConfig::load`].
pub const CONFIG_PATH_ENV: &str = "MINTGATE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("invalid config parameter {param}: {reason}")]
    InvalidParameter {
        param: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Global fixed-supply cap in base units.
    pub supply_cap: Amount,
}

impl Default for TokenConfig {
    fn default() -> Self {
        // 1 billion tokens with 18 decimals
        Self {
            supply_cap: 1_000_000_000u128 * 10u128.pow(18),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionsConfig {
    /// Upper bound on recipients per batch emission; 0 disables the bound.
    pub max_batch_len: usize,
}

impl Default for EmissionsConfig {
    fn default() -> Self {
        Self { max_batch_len: 500 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Age after which an unsettled bridge transfer is reported as overdue.
    pub settlement_alert_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            settlement_alert_secs: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MintgateConfig {
    pub token: TokenConfig,
    pub emissions: EmissionsConfig,
    pub bridge: BridgeConfig,
}

impl MintgateConfig {
    /// Defaults, optionally replaced by the file named in `MINTGATE_CONFIG`,
    /// then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "loaded mintgate config");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MintgateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(cap) = env_parse::<Amount>("MINTGATE_SUPPLY_CAP")? {
            self.token.supply_cap = cap;
        }
        if let Some(len) = env_parse::<usize>("MINTGATE_MAX_BATCH_LEN")? {
            self.emissions.max_batch_len = len;
        }
        if let Some(secs) = env_parse::<u64>("MINTGATE_BRIDGE_ALERT_SECS")? {
            self.bridge.settlement_alert_secs = secs;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.supply_cap == 0 {
            return Err(ConfigError::InvalidParameter {
                param: "token.supply_cap",
                reason: "must be greater than 0",
            });
        }
        if self.bridge.settlement_alert_secs == 0 {
            return Err(ConfigError::InvalidParameter {
                param: "bridge.settlement_alert_secs",
                reason: "must be greater than 0",
            });
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => {
            debug!(key, value = %raw, "config override from environment");
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidEnv { key, value: raw })
        }
        Err(_) => Ok(None),
    }
}
