//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     HttpClient::new(config) → start() → evictor task spawned
//!
//! Shutdown:
//!     HttpClient::shutdown() → broadcast signal → evictor loop exits
//!                            → idle connections closed
//! ```
//!
//! # Design Decisions
//! - Explicit start()/shutdown() calls owned by the embedding process;
//!   no registry or annotation-driven lifecycle
//! - Shutdown is signal-based; eviction is idempotent so no drain wait

pub mod shutdown;

pub use shutdown::Shutdown;
