//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::config::schema::BridgeConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::error::BridgeError;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for BridgeError {
    fn from(e: ConfigError) -> Self {
        BridgeError::Config(e.to_string())
    }
}

/// Load bridge settings from a TOML file. Validation is left to the caller
/// because CLI flags are applied on top first.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Validate a fully assembled configuration.
pub fn finalize(config: BridgeConfig) -> Result<BridgeConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Read a YAML document into `T`, tagging failures with `what`.
pub fn read_yaml<T: DeserializeOwned>(path: &Path, what: &'static str) -> Result<T, BridgeError> {
    let content = fs::read_to_string(path).map_err(|source| BridgeError::Read {
        what,
        path: PathBuf::from(path),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| BridgeError::Unmarshal {
        what,
        path: PathBuf::from(path),
        source,
    })
}
