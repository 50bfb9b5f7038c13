//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check value ranges (limits > 0, per-destination ≤ total)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: PoolConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted into the client

use thiserror::Error;

use crate::config::schema::PoolConfig;

/// A single semantic violation in a [`PoolConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("max_total_connections must be greater than zero")]
    ZeroTotalConnections,

    #[error("max_per_destination must be greater than zero")]
    ZeroPerDestination,

    #[error("max_per_destination ({per_destination}) exceeds max_total_connections ({total})")]
    PerDestinationExceedsTotal { per_destination: usize, total: usize },

    #[error("connection_ttl_secs must be greater than zero")]
    ZeroConnectionTtl,

    #[error("idle_eviction_interval_secs must be greater than zero")]
    ZeroEvictionInterval,

    #[error("connect_timeout_ms must be greater than zero")]
    ZeroConnectTimeout,

    #[error("read_timeout_ms must be greater than zero")]
    ZeroReadTimeout,
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &PoolConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.max_total_connections == 0 {
        errors.push(ValidationError::ZeroTotalConnections);
    }
    if config.max_per_destination == 0 {
        errors.push(ValidationError::ZeroPerDestination);
    }
    if config.max_per_destination > config.max_total_connections {
        errors.push(ValidationError::PerDestinationExceedsTotal {
            per_destination: config.max_per_destination,
            total: config.max_total_connections,
        });
    }
    if config.connection_ttl_secs == 0 {
        errors.push(ValidationError::ZeroConnectionTtl);
    }
    if config.idle_eviction_interval_secs == 0 {
        errors.push(ValidationError::ZeroEvictionInterval);
    }
    if config.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if config.read_timeout_ms == 0 {
        errors.push(ValidationError::ZeroReadTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
