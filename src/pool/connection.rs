//! Pooled connection records and destination identity.
//!
//! # Responsibilities
//! - Identify destinations (scheme+host+port) that partition pool state
//! - Generate unique connection IDs for tracing
//! - Track per-connection lifetimes (created, released, keep-alive deadline)

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::Full;
use hyper::client::conn::http1;
use thiserror::Error;
use url::Url;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is sufficient since we only need uniqueness.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Network endpoint identity a connection targets.
///
/// Pool state is partitioned by destination: capacity limits and idle sets
/// are tracked per scheme+host+port tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

/// Error for URLs that cannot name a destination (no host, no usable port).
#[derive(Debug, Error)]
#[error("url does not name a usable destination: {0}")]
pub struct InvalidDestination(pub String);

impl Destination {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// Shorthand for a plain-http destination.
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self::new("http", host, port)
    }

    /// Extract the destination identity from a URL, defaulting the port by
    /// scheme (80 for http, 443 for https).
    pub fn from_url(url: &Url) -> Result<Self, InvalidDestination> {
        let host = url
            .host_str()
            .ok_or_else(|| InvalidDestination(url.to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| InvalidDestination(url.to_string()))?;
        Ok(Self::new(url.scheme(), host, port))
    }

    /// `host:port` form, used for the Host header and TCP connect.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Parked in the pool, available for lease.
    Idle,
    /// Exclusively owned by one in-flight request.
    Leased,
    /// Closed or about to be; never leased again.
    Retired,
}

/// A reusable HTTP/1 connection owned by the pool.
///
/// Exclusively owned by the pool while `Idle` and by the lease holder while
/// `Leased`; the ownership move through the lease guard is what enforces
/// at-most-one-leaseholder.
pub struct PooledConnection {
    id: ConnectionId,
    destination: Destination,
    created_at: Instant,
    last_released_at: Option<Instant>,
    /// Deadline derived from the server's keep-alive hint. Unset means the
    /// time-to-live ceiling alone governs expiry.
    keep_alive_until: Option<Instant>,
    state: ConnectionState,
    /// Request handle for the spawned hyper connection task. Dropping it
    /// closes the underlying transport.
    pub(crate) sender: http1::SendRequest<Full<Bytes>>,
}

impl PooledConnection {
    pub(crate) fn new(
        id: ConnectionId,
        destination: Destination,
        sender: http1::SendRequest<Full<Bytes>>,
    ) -> Self {
        Self {
            id,
            destination,
            created_at: Instant::now(),
            last_released_at: None,
            keep_alive_until: None,
            state: ConnectionState::Leased,
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_released_at(&self) -> Option<Instant> {
        self.last_released_at
    }

    pub fn keep_alive_until(&self) -> Option<Instant> {
        self.keep_alive_until
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The instant past which this connection must not be leased: the
    /// keep-alive deadline when one is set, never later than the
    /// time-to-live ceiling.
    pub fn expires_at(&self, ttl: Duration) -> Instant {
        let ceiling = self.created_at + ttl;
        match self.keep_alive_until {
            Some(deadline) => deadline.min(ceiling),
            None => ceiling,
        }
    }

    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now >= self.expires_at(ttl)
    }

    pub(crate) fn mark_leased(&mut self) {
        self.state = ConnectionState::Leased;
    }

    /// Park the connection. The caller (pool release) has already capped the
    /// keep-alive deadline at the time-to-live ceiling.
    pub(crate) fn mark_idle(&mut self, now: Instant, keep_alive_until: Instant) {
        self.state = ConnectionState::Idle;
        self.last_released_at = Some(now);
        self.keep_alive_until = Some(keep_alive_until);
    }

    pub(crate) fn retire(&mut self) {
        self.state = ConnectionState::Retired;
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("destination", &self.destination)
            .field("state", &self.state)
            .field("keep_alive_until", &self.keep_alive_until)
            .finish_non_exhaustive()
    }
}
