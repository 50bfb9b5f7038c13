//! The public request-dispatch entry point.
//!
//! # Responsibilities
//! - Lease a connection, run one exchange, release or discard it
//! - Enforce the read timeout around the full response
//! - Resolve the keep-alive deadline from response headers on release
//!
//! # Design Decisions
//! - No automatic retry at any layer; failures are reported once
//! - Timed-out or failed connections are discarded, never released: their
//!   protocol state is unknown
//! - The request is built before leasing, so a malformed request never
//!   touches the pool

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::HOST;
use hyper::{HeaderMap, Method, Request};
use tokio::time;

use crate::config::PoolConfig;
use crate::executor::error::{ExecutorError, TransportError};
use crate::executor::response::Response;
use crate::lifecycle::Shutdown;
use crate::pool::{keep_alive, ConnectionPool, Destination, IdleEvictor};

/// Outbound HTTP client over a bounded connection pool.
///
/// Construct with [`new`](Self::new), call [`start`](Self::start) once at a
/// defined point during process startup, and [`shutdown`](Self::shutdown)
/// when done.
pub struct HttpClient {
    config: PoolConfig,
    pool: Arc<ConnectionPool>,
    shutdown: Shutdown,
}

impl HttpClient {
    /// Build a client from an explicit configuration value.
    pub fn new(config: PoolConfig) -> Self {
        let pool = Arc::new(ConnectionPool::new(config.clone()));
        Self {
            config,
            pool,
            shutdown: Shutdown::new(),
        }
    }

    /// Spawn the idle-eviction task. Call once at startup; each call spawns
    /// another sweeper.
    pub fn start(&self) {
        let evictor = IdleEvictor::new(
            Arc::clone(&self.pool),
            self.config.idle_eviction_interval(),
        );
        tokio::spawn(evictor.run(self.shutdown.subscribe()));
    }

    /// Issue one request and collect the full response.
    ///
    /// Fails fast when the pool has no capacity; bounds the transport dial
    /// with the connect timeout and the complete exchange with the read
    /// timeout. On success the connection returns to the pool with a
    /// keep-alive deadline resolved from the response's Connection header;
    /// on any failure it is discarded. Dropping the returned future
    /// mid-flight also discards the leased connection.
    pub async fn execute(
        &self,
        destination: &Destination,
        method: Method,
        path: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Response, ExecutorError> {
        let request = build_request(destination, method, path, headers, body)
            .map_err(|err| ExecutorError::Transport(TransportError::Request(err)))?;

        let started = Instant::now();
        let mut lease = self.pool.lease(destination).await?;

        let read_timeout = self.config.read_timeout();
        let exchange = async {
            let sender = lease.sender();
            sender.ready().await?;
            let response = sender.send_request(request).await?;
            let (parts, body) = response.into_parts();
            let bytes = body.collect().await?.to_bytes();
            Ok::<_, hyper::Error>((parts, bytes))
        };

        let outcome = time::timeout(read_timeout, exchange).await;

        match outcome {
            Ok(Ok((parts, bytes))) => {
                let directives = keep_alive::connection_directives(&parts.headers);
                let keep = keep_alive::resolve(&directives);
                tracing::debug!(
                    destination = %destination,
                    status = %parts.status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request completed"
                );
                self.pool.release(lease, keep);
                Ok(Response {
                    status: parts.status,
                    headers: parts.headers,
                    body: bytes,
                })
            }
            Ok(Err(err)) => {
                tracing::warn!(destination = %destination, "request failed: {err}");
                self.pool.discard(lease);
                Err(ExecutorError::Transport(TransportError::Http(err)))
            }
            Err(_) => {
                tracing::warn!(
                    destination = %destination,
                    timeout_ms = read_timeout.as_millis() as u64,
                    "read timed out"
                );
                self.pool.discard(lease);
                Err(ExecutorError::ReadTimeout(read_timeout))
            }
        }
    }

    /// Stop the evictor and close all idle connections.
    pub fn shutdown(&self) {
        let signalled = self.shutdown.receiver_count();
        self.shutdown.trigger();
        let closed = self.pool.clear_idle();
        tracing::info!(signalled, closed, "http client shut down");
    }

    /// The pool backing this client, for introspection.
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }
}

fn build_request(
    destination: &Destination,
    method: Method,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Request<Full<Bytes>>, http::Error> {
    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(HOST, destination.authority())
        .body(Full::new(body))?;
    request
        .headers_mut()
        .extend(headers.iter().map(|(name, value)| (name.clone(), value.clone())));
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_sets_host_and_headers() {
        let destination = Destination::http("orders.internal", 8080);
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "abc-123".parse().unwrap());

        let request = build_request(
            &destination,
            Method::GET,
            "/api/orders",
            &headers,
            Bytes::new(),
        )
        .unwrap();

        assert_eq!(request.uri().path(), "/api/orders");
        assert_eq!(request.headers()[HOST], "orders.internal:8080");
        assert_eq!(request.headers()["x-request-id"], "abc-123");
    }
}
