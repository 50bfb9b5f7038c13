//! Configuration schema definitions.
//!
//! This module defines the pool configuration structure. All types derive
//! Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pool and timeout configuration, immutable once the client is built.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of connections across all destinations.
    pub max_total_connections: usize,

    /// Maximum number of connections per destination (scheme+host+port).
    pub max_per_destination: usize,

    /// Hard ceiling on connection age, in seconds. A connection older than
    /// this is never leased again, regardless of server keep-alive hints.
    pub connection_ttl_secs: u64,

    /// Period of the background idle-eviction sweep, in seconds.
    pub idle_eviction_interval_secs: u64,

    /// Maximum time to establish a transport (TCP connect + HTTP handshake),
    /// in milliseconds.
    pub connect_timeout_ms: u64,

    /// Maximum time to receive a complete response, in milliseconds.
    pub read_timeout_ms: u64,
}

impl PoolConfig {
    /// Relaxed preset: 5 s connect, 5 s read. This is also `Default`.
    pub fn standard() -> Self {
        Self {
            max_total_connections: 200,
            max_per_destination: 20,
            connection_ttl_secs: 30,
            idle_eviction_interval_secs: 30,
            connect_timeout_ms: 5_000,
            read_timeout_ms: 5_000,
        }
    }

    /// Aggressive preset for latency-sensitive callers: 100 ms connect,
    /// 500 ms read. Same pool limits as [`standard`](Self::standard).
    pub fn low_latency() -> Self {
        Self {
            connect_timeout_ms: 100,
            read_timeout_ms: 500,
            ..Self::standard()
        }
    }

    /// Connect timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Read timeout as a `Duration`.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Connection time-to-live ceiling as a `Duration`.
    pub fn connection_ttl(&self) -> Duration {
        Duration::from_secs(self.connection_ttl_secs)
    }

    /// Idle-eviction sweep period as a `Duration`.
    pub fn idle_eviction_interval(&self) -> Duration {
        Duration::from_secs(self.idle_eviction_interval_secs)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_preset() {
        let config = PoolConfig::standard();
        assert_eq!(config.max_total_connections, 200);
        assert_eq!(config.max_per_destination, 20);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.read_timeout(), Duration::from_secs(5));
        assert_eq!(config.connection_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn test_low_latency_preset() {
        let config = PoolConfig::low_latency();
        assert_eq!(config.connect_timeout(), Duration::from_millis(100));
        assert_eq!(config.read_timeout(), Duration::from_millis(500));
        // Pool limits are shared between presets.
        assert_eq!(config.max_total_connections, 200);
        assert_eq!(config.max_per_destination, 20);
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: PoolConfig = toml::from_str("max_per_destination = 5").unwrap();
        assert_eq!(config.max_per_destination, 5);
        assert_eq!(config.max_total_connections, 200);
        assert_eq!(config.idle_eviction_interval_secs, 30);
    }
}
