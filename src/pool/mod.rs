//! Connection pooling subsystem.
//!
//! # Data Flow
//! ```text
//! executor leases
//!     → pool.rs (idle reuse, or reserve slot + dial)
//!     → request flows over the leased connection
//!     → release: keep_alive.rs resolves the idle deadline from the
//!       response's Connection header, capped at the ttl ceiling
//!     → or discard: failed/timed-out connections are closed, never reused
//!
//! evictor.rs ticks independently
//!     → pool.evict_expired(now) closes overdue idle connections
//! ```
//!
//! # Design Decisions
//! - Pool state is partitioned by destination (scheme+host+port)
//! - Ownership transfer through the Lease guard enforces the
//!   at-most-one-leaseholder invariant
//! - The time-to-live ceiling always beats the server's keep-alive hint

pub mod connection;
pub mod evictor;
pub mod keep_alive;
pub mod pool;

pub use connection::{ConnectionId, ConnectionState, Destination, InvalidDestination, PooledConnection};
pub use evictor::IdleEvictor;
pub use pool::{ConnectionPool, Lease, PoolError};
