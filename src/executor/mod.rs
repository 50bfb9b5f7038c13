//! Request execution subsystem.
//!
//! # Data Flow
//! ```text
//! caller → HttpClient::execute
//!     → pool.lease (fail fast on exhaustion)
//!     → one HTTP/1 exchange, bounded by the read timeout
//!     → success: release with keep-alive from response headers
//!     → failure/timeout: discard, surface a typed ExecutorError
//! ```
//!
//! # Design Decisions
//! - Exactly one attempt per call; the caller owns retry policy
//! - Error kinds distinguish exhaustion, connect timeout, read timeout,
//!   and transport failure so callers can react differently to each

pub mod client;
pub mod error;
pub mod response;

pub use client::HttpClient;
pub use error::{ExecutorError, TransportError};
pub use response::Response;
