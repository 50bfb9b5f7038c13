//! Pooled outbound HTTP client.
//!
//! Reuses a bounded set of persistent connections to downstream services
//! instead of opening one per request.
//!
//! ```text
//!  caller ──▶ executor ──▶ pool.lease ──▶ (network I/O) ──▶ pool.release
//!                              │                                 │
//!                              │            keep-alive deadline ◀┘
//!                              │            from response headers,
//!                              │            capped by the ttl ceiling
//!                              ▼
//!                         evictor ticks independently, closing
//!                         idle connections past their deadline
//! ```
//!
//! Capacity is capped pool-wide and per destination; leasing never waits for
//! capacity. Exhaustion is an immediate error and the caller's backpressure
//! signal. Connect and read timeouts are strict, and nothing is retried:
//! a failed request is reported once and the caller owns retry policy.

// Core subsystems
pub mod config;
pub mod executor;
pub mod pool;

// Cross-cutting concerns
pub mod lifecycle;

pub use config::PoolConfig;
pub use executor::{ExecutorError, HttpClient, Response};
pub use pool::{ConnectionPool, Destination};
