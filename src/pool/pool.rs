//! Connection pool: bounded, destination-partitioned, lease-based.
//!
//! # Responsibilities
//! - Enforce per-destination and pool-wide capacity limits
//! - Hand out idle connections before dialing new ones
//! - Retire connections past their keep-alive deadline or ttl ceiling
//!
//! # Design Decisions
//! - One pool-wide mutex over all state; lease/release/discard/evict never
//!   interleave on the same connection
//! - Dialing happens outside the lock against a reserved capacity slot,
//!   rolled back if the dial fails
//! - Leasing never blocks waiting for capacity; exhaustion is an immediate
//!   error and the caller's backpressure signal

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::Full;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;

use crate::config::PoolConfig;
use crate::pool::connection::{ConnectionId, Destination, PooledConnection};

/// Why a lease could not be granted.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no connection capacity for {destination}")]
    Exhausted { destination: Destination },

    #[error("connect to {destination} timed out after {timeout:?}")]
    ConnectTimeout {
        destination: Destination,
        timeout: Duration,
    },

    #[error("connect to {destination} failed: {source}")]
    Connect {
        destination: Destination,
        #[source]
        source: std::io::Error,
    },

    #[error("http handshake with {destination} failed: {source}")]
    Handshake {
        destination: Destination,
        #[source]
        source: hyper::Error,
    },
}

#[derive(Default)]
struct PoolState {
    /// Idle connections per destination, most recently released at the back.
    idle: HashMap<Destination, VecDeque<PooledConnection>>,
    /// Count of live (idle + leased) connections per destination.
    per_destination: HashMap<Destination, usize>,
    /// Count of live connections pool-wide.
    total: usize,
}

impl PoolState {
    /// Free the capacity slot a connection occupied.
    fn release_slot(&mut self, destination: &Destination) {
        if let Some(count) = self.per_destination.get_mut(destination) {
            *count -= 1;
            if *count == 0 {
                self.per_destination.remove(destination);
            }
        }
        self.total = self.total.saturating_sub(1);
    }
}

/// Bounded set of reusable connections, partitioned by destination.
pub struct ConnectionPool {
    config: PoolConfig,
    state: Mutex<PoolState>,
}

/// Exclusive ownership of one pooled connection for one in-flight request.
///
/// Must be handed back through [`ConnectionPool::release`] or
/// [`ConnectionPool::discard`]. A lease dropped with neither (caller
/// abandoned the request) discards the connection: its protocol state is
/// indeterminate, so it never re-enters the idle set.
pub struct Lease {
    pool: Arc<ConnectionPool>,
    conn: Option<PooledConnection>,
}

impl Lease {
    // A Lease carries its connection from grant until release/discard
    // consumes it by value, so the accessors below cannot observe None.

    pub fn id(&self) -> ConnectionId {
        self.conn.as_ref().expect("lease already consumed").id()
    }

    pub fn destination(&self) -> &Destination {
        self.conn
            .as_ref()
            .expect("lease already consumed")
            .destination()
    }

    pub(crate) fn sender(&mut self) -> &mut http1::SendRequest<Full<Bytes>> {
        &mut self
            .conn
            .as_mut()
            .expect("lease already consumed")
            .sender
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.forget(conn);
        }
    }
}

/// Rollback handle for a capacity slot reserved ahead of a dial.
struct SlotGuard {
    pool: Arc<ConnectionPool>,
    destination: Destination,
    armed: bool,
}

impl SlotGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if self.armed {
            self.pool.locked().release_slot(&self.destination);
        }
    }
}

impl ConnectionPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PoolState::default()),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn locked(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().expect("pool lock poisoned")
    }

    /// Lease a connection for `destination`.
    ///
    /// Reuses an idle connection when one is still live; expired or
    /// remotely-closed ones found on the way are retired and skipped. On a
    /// miss, a capacity slot is reserved and a new transport dialed, bounded
    /// by the connect timeout. Fails fast with [`PoolError::Exhausted`] when
    /// either limit is reached; never waits for capacity.
    pub async fn lease(self: &Arc<Self>, destination: &Destination) -> Result<Lease, PoolError> {
        let now = Instant::now();
        let ttl = self.config.connection_ttl();

        {
            let mut state = self.locked();
            loop {
                let candidate = state
                    .idle
                    .get_mut(destination)
                    .and_then(|queue| queue.pop_back());
                let Some(mut conn) = candidate else { break };

                if conn.is_expired(now, ttl) || conn.sender.is_closed() {
                    tracing::debug!(
                        id = %conn.id(),
                        destination = %destination,
                        "retiring stale idle connection"
                    );
                    conn.retire();
                    state.release_slot(destination);
                    continue;
                }

                conn.mark_leased();
                tracing::trace!(id = %conn.id(), destination = %destination, "reusing idle connection");
                return Ok(Lease {
                    pool: Arc::clone(self),
                    conn: Some(conn),
                });
            }

            let in_use = state.per_destination.get(destination).copied().unwrap_or(0);
            if in_use >= self.config.max_per_destination
                || state.total >= self.config.max_total_connections
            {
                return Err(PoolError::Exhausted {
                    destination: destination.clone(),
                });
            }

            // Reserve the slot before dropping the lock; the dial below runs
            // against this reservation.
            *state.per_destination.entry(destination.clone()).or_insert(0) += 1;
            state.total += 1;
        }

        // The guard rolls the reservation back if the dial fails or the
        // caller drops this future mid-dial.
        let slot = SlotGuard {
            pool: Arc::clone(self),
            destination: destination.clone(),
            armed: true,
        };

        let conn = self.dial(destination).await?;
        slot.disarm();
        tracing::debug!(id = %conn.id(), destination = %destination, "opened new connection");
        Ok(Lease {
            pool: Arc::clone(self),
            conn: Some(conn),
        })
    }

    /// Open a transport and perform the HTTP/1 handshake, bounded by the
    /// connect timeout. The connection task is spawned here and lives until
    /// the sender is dropped.
    async fn dial(&self, destination: &Destination) -> Result<PooledConnection, PoolError> {
        let timeout = self.config.connect_timeout();
        let connect = async {
            let stream = TcpStream::connect((destination.host.as_str(), destination.port))
                .await
                .map_err(|source| PoolError::Connect {
                    destination: destination.clone(),
                    source,
                })?;
            http1::handshake(TokioIo::new(stream))
                .await
                .map_err(|source| PoolError::Handshake {
                    destination: destination.clone(),
                    source,
                })
        };

        let (sender, driver) = match time::timeout(timeout, connect).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(PoolError::ConnectTimeout {
                    destination: destination.clone(),
                    timeout,
                })
            }
        };

        let id = ConnectionId::new();
        tokio::spawn(async move {
            if let Err(err) = driver.await {
                tracing::debug!(id = %id, "connection task ended: {err}");
            }
        });

        Ok(PooledConnection::new(id, destination.clone(), sender))
    }

    /// Return a connection to the idle set.
    ///
    /// The keep-alive deadline becomes `now + keep_alive`, capped at the
    /// connection's time-to-live ceiling; the server hint can never extend a
    /// connection past the ceiling.
    pub fn release(&self, mut lease: Lease, keep_alive: Duration) {
        let Some(mut conn) = lease.conn.take() else { return };
        let now = Instant::now();
        let ceiling = conn.created_at() + self.config.connection_ttl();
        // A hint large enough to overflow the clock saturates to the ceiling,
        // which caps every hint anyway.
        let deadline = now
            .checked_add(keep_alive)
            .map_or(ceiling, |hinted| hinted.min(ceiling));
        conn.mark_idle(now, deadline);

        tracing::trace!(
            id = %conn.id(),
            destination = %conn.destination(),
            keep_alive_secs = keep_alive.as_secs(),
            "released connection to idle set"
        );

        let mut state = self.locked();
        state
            .idle
            .entry(conn.destination().clone())
            .or_default()
            .push_back(conn);
    }

    /// Retire a connection without returning it to the idle set.
    ///
    /// Used after request failure or timeout, when the connection's protocol
    /// state is unknown. Dropping the sender closes the transport.
    pub fn discard(&self, mut lease: Lease) {
        if let Some(mut conn) = lease.conn.take() {
            conn.retire();
            self.locked().release_slot(conn.destination());
            tracing::debug!(id = %conn.id(), destination = %conn.destination(), "discarded connection");
        }
    }

    /// Slot accounting for a lease dropped without release or discard.
    pub(crate) fn forget(&self, mut conn: PooledConnection) {
        conn.retire();
        self.locked().release_slot(conn.destination());
        tracing::debug!(id = %conn.id(), "lease dropped mid-flight; connection discarded");
    }

    /// Close idle connections past their keep-alive deadline or ttl ceiling,
    /// whichever is sooner. Returns the number evicted; called only by the
    /// idle evictor. Leased connections are invisible to this sweep.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let ttl = self.config.connection_ttl();
        let mut state = self.locked();
        let PoolState {
            idle,
            per_destination,
            total,
        } = &mut *state;

        let mut evicted = 0;
        for (destination, queue) in idle.iter_mut() {
            let before = queue.len();
            queue.retain(|conn| !conn.is_expired(now, ttl));
            let removed = before - queue.len();
            if removed > 0 {
                if let Some(count) = per_destination.get_mut(destination) {
                    *count -= removed;
                }
                *total = total.saturating_sub(removed);
                evicted += removed;
            }
        }
        idle.retain(|_, queue| !queue.is_empty());
        per_destination.retain(|_, count| *count > 0);
        evicted
    }

    /// Close every idle connection; the shutdown path. Returns the number
    /// closed.
    pub fn clear_idle(&self) -> usize {
        let mut state = self.locked();
        let PoolState {
            idle,
            per_destination,
            total,
        } = &mut *state;

        let mut closed = 0;
        for (destination, queue) in idle.iter_mut() {
            let removed = queue.len();
            if removed > 0 {
                if let Some(count) = per_destination.get_mut(destination) {
                    *count -= removed;
                }
                *total = total.saturating_sub(removed);
                closed += removed;
            }
            queue.clear();
        }
        idle.clear();
        per_destination.retain(|_, count| *count > 0);
        closed
    }

    /// Number of idle connections across all destinations.
    pub fn idle_count(&self) -> usize {
        self.locked().idle.values().map(|queue| queue.len()).sum()
    }

    /// Number of live (idle + leased) connections pool-wide.
    pub fn total_count(&self) -> usize {
        self.locked().total
    }
}
