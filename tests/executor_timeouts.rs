//! Timeout classification, discard-on-failure, and shutdown behavior.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use hyper::{HeaderMap, Method};

use http_client_pool::config::PoolConfig;
use http_client_pool::pool::Destination;
use http_client_pool::{ExecutorError, HttpClient};

mod common;

async fn get(
    client: &HttpClient,
    dest: &Destination,
) -> Result<http_client_pool::Response, ExecutorError> {
    client
        .execute(dest, Method::GET, "/", &HeaderMap::new(), Bytes::new())
        .await
}

#[tokio::test]
async fn test_successful_exchange_collects_response() {
    let origin = common::start_origin(Some("keep-alive, timeout=15"), Duration::ZERO).await;
    let client = HttpClient::new(PoolConfig::standard());
    let dest = Destination::http("127.0.0.1", origin.addr.port());

    let response = get(&client, &dest).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body_str(), Some("ok"));
    assert!(response.headers.contains_key("connection"));
}

#[tokio::test]
async fn test_read_timeout_discards_connection() {
    common::init_tracing();
    let origin = common::start_origin(Some("keep-alive"), Duration::from_millis(300)).await;
    let config = PoolConfig {
        read_timeout_ms: 100,
        ..PoolConfig::standard()
    };
    let client = HttpClient::new(config);
    let dest = Destination::http("127.0.0.1", origin.addr.port());

    let result = get(&client, &dest).await;
    assert!(matches!(result, Err(ExecutorError::ReadTimeout(_))));

    // The timed-out connection must not sit in the idle set.
    assert_eq!(client.pool().idle_count(), 0);
    assert_eq!(client.pool().total_count(), 0);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let addr = common::unused_addr().await;
    let client = HttpClient::new(PoolConfig::standard());
    let dest = Destination::http("127.0.0.1", addr.port());

    let result = get(&client, &dest).await;
    assert!(matches!(result, Err(ExecutorError::Transport(_))));

    // The slot reserved for the failed dial was rolled back.
    assert_eq!(client.pool().total_count(), 0);
}

#[tokio::test]
async fn test_failure_then_success_on_fresh_connection() {
    // A read timeout consumes the connection; the next call dials fresh and
    // succeeds. No retry happened inside the client: two calls, two results.
    let slow = common::start_origin(Some("keep-alive"), Duration::from_millis(300)).await;
    let config = PoolConfig {
        read_timeout_ms: 100,
        ..PoolConfig::standard()
    };
    let client = HttpClient::new(config);
    let dest = Destination::http("127.0.0.1", slow.addr.port());

    assert!(get(&client, &dest).await.is_err());

    let fast = common::start_origin(Some("keep-alive"), Duration::ZERO).await;
    let dest = Destination::http("127.0.0.1", fast.addr.port());
    assert!(get(&client, &dest).await.is_ok());
    assert_eq!(fast.connection_count(), 1);
}

#[tokio::test]
async fn test_abandoned_request_discards_lease() {
    let origin = common::start_origin(Some("keep-alive"), Duration::from_millis(300)).await;
    let client = HttpClient::new(PoolConfig::standard());
    let dest = Destination::http("127.0.0.1", origin.addr.port());

    // Drop the in-flight request partway through.
    tokio::select! {
        _ = get(&client, &dest) => panic!("request should not finish in 50ms"),
        _ = tokio::time::sleep(Duration::from_millis(50)) => {}
    }

    // The abandoned connection was discarded, not parked for reuse.
    assert_eq!(client.pool().idle_count(), 0);
    assert_eq!(client.pool().total_count(), 0);
}

#[tokio::test]
async fn test_shutdown_closes_idle_connections() {
    let origin = common::start_origin(Some("keep-alive, timeout=15"), Duration::ZERO).await;
    let client = HttpClient::new(PoolConfig::standard());
    client.start();
    let dest = Destination::http("127.0.0.1", origin.addr.port());

    get(&client, &dest).await.unwrap();
    assert_eq!(client.pool().idle_count(), 1);

    client.shutdown();
    assert_eq!(client.pool().idle_count(), 0);
    assert_eq!(client.pool().total_count(), 0);
}

#[tokio::test]
async fn test_evictor_task_reclaims_in_background() {
    // Server opts out of reuse; the sweeper (1 s period) collects the parked
    // connection that expired on release.
    let origin = common::start_origin(Some("keep-alive, timeout=0"), Duration::ZERO).await;
    let config = PoolConfig {
        idle_eviction_interval_secs: 1,
        ..PoolConfig::standard()
    };
    let client = Arc::new(HttpClient::new(config));
    client.start();
    let dest = Destination::http("127.0.0.1", origin.addr.port());

    get(&client, &dest).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(client.pool().idle_count(), 0);
    assert_eq!(client.pool().total_count(), 0);
    client.shutdown();
}
