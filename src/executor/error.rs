//! Error types surfaced by the request executor.

use std::time::Duration;

use thiserror::Error;

use crate::pool::{Destination, PoolError};

/// Low-level I/O failure, distinct from a timeout.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("http exchange failed: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid request: {0}")]
    Request(#[from] http::Error),
}

/// Terminal failure of a single `execute` call.
///
/// Nothing here is retried internally; the caller owns retry policy. Every
/// variant except [`Unavailable`](Self::Unavailable) has consumed (discarded)
/// the connection it was using.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The pool could not grant a lease: both reuse and new-connection
    /// capacity were exhausted for this destination.
    #[error("connection pool exhausted for {0}")]
    Unavailable(Destination),

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),

    #[error(transparent)]
    Transport(TransportError),
}

impl From<PoolError> for ExecutorError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Exhausted { destination } => ExecutorError::Unavailable(destination),
            PoolError::ConnectTimeout { timeout, .. } => ExecutorError::ConnectTimeout(timeout),
            PoolError::Connect { source, .. } => {
                ExecutorError::Transport(TransportError::Io(source))
            }
            PoolError::Handshake { source, .. } => {
                ExecutorError::Transport(TransportError::Http(source))
            }
        }
    }
}
