//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Initialize test logging; safe to call from every test.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "http_client_pool=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Handle to a mock origin server.
pub struct Origin {
    pub addr: SocketAddr,
    /// Number of TCP connections accepted so far.
    pub connections: Arc<AtomicUsize>,
    /// Number of HTTP requests served so far.
    pub requests: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl Origin {
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Start a keep-alive-capable mock origin on an ephemeral port.
///
/// Serves `200 OK` with body `ok` to every request, keeping each accepted
/// connection open for further requests. `connection_header`, when set, is
/// echoed as the response's `Connection` header (e.g. `"keep-alive,
/// timeout=15"`). `response_delay` is applied before every response, for
/// read-timeout scenarios.
pub async fn start_origin(
    connection_header: Option<&'static str>,
    response_delay: Duration,
) -> Origin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(AtomicUsize::new(0));

    let accepted = connections.clone();
    let served = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    let served = served.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let mut pending: Vec<u8> = Vec::new();
                        loop {
                            let n = match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => n,
                            };
                            pending.extend_from_slice(&buf[..n]);
                            // One response per complete request head; the
                            // tests only send bodyless requests.
                            while let Some(end) = end_of_head(&pending) {
                                pending.drain(..end);
                                served.fetch_add(1, Ordering::SeqCst);
                                if !response_delay.is_zero() {
                                    tokio::time::sleep(response_delay).await;
                                }
                                let body = "ok";
                                let extra = connection_header
                                    .map(|v| format!("Connection: {}\r\n", v))
                                    .unwrap_or_default();
                                let response = format!(
                                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}\r\n{}",
                                    body.len(),
                                    extra,
                                    body
                                );
                                if socket.write_all(response.as_bytes()).await.is_err() {
                                    return;
                                }
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    Origin {
        addr,
        connections,
        requests,
    }
}

fn end_of_head(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

/// An address nothing is listening on: bind an ephemeral port, then drop
/// the listener.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
