//! Periodic idle-connection eviction.
//!
//! # Responsibilities
//! - Sweep the pool on a fixed interval
//! - Close idle connections past their deadline, reclaiming capacity
//!
//! # Design Decisions
//! - Eviction counts are an observability signal, never an error
//! - The sweep is idempotent, so shutdown is just cancelling the loop

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time;

use crate::pool::ConnectionPool;

/// Recurring background sweep over the pool's idle connections.
pub struct IdleEvictor {
    pool: Arc<ConnectionPool>,
    interval: Duration,
}

impl IdleEvictor {
    pub fn new(pool: Arc<ConnectionPool>, interval: Duration) -> Self {
        Self { pool, interval }
    }

    /// Run until the shutdown signal arrives.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "idle evictor starting"
        );

        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.pool.evict_expired(Instant::now());
                    if evicted > 0 {
                        tracing::info!(evicted, "closed expired idle connections");
                    } else {
                        tracing::debug!("eviction sweep found nothing to close");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("idle evictor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
