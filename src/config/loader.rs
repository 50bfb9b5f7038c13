//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::PoolConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Why a configuration file could not be turned into a usable [`PoolConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {}", list_violations(.0))]
    Validation(Vec<ValidationError>),
}

fn list_violations(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a pool configuration from a TOML file and run semantic validation.
///
/// Unset fields take their defaults, so a partial file is fine; a file that
/// parses but violates the schema's invariants reports every violation at
/// once.
pub fn load_config(path: &Path) -> Result<PoolConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: PoolConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
