use std::sync::Arc;
use std::time::Duration;

use wsc_core::traits::NoopCallbacks;
use wsc_core::{ClientConfig, ConnectionState, ErrorKind};
use wsc_transport::WsClient;

/// A client pointed at a closed local port never reaches `Connected`, fails
/// fast on send, and still shuts down cleanly within the budget.
#[tokio::test]
async fn client_against_unreachable_endpoint_fails_fast_and_stops_cleanly() {
    let config = ClientConfig::new("ws://127.0.0.1:1").with_max_fast_retries(1);
    let client = WsClient::spawn(config, Arc::new(NoopCallbacks), None, None);

    let err = client.send_text("hello").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConnectionLost);
    assert_ne!(client.state(), ConnectionState::Connected);

    let stopped = tokio::time::timeout(Duration::from_secs(5), client.stop()).await;
    assert!(stopped.is_ok(), "stop() must complete within its shutdown budget");
}

/// `stop()` is idempotent across two independently spawned clients driven
/// concurrently, and neither's shutdown blocks on the other's supervisor.
#[tokio::test]
async fn two_clients_shut_down_independently() {
    let first = WsClient::spawn(
        ClientConfig::new("ws://127.0.0.1:1").with_max_fast_retries(0),
        Arc::new(NoopCallbacks),
        None,
        None,
    );
    let second = WsClient::spawn(
        ClientConfig::new("ws://127.0.0.1:2").with_max_fast_retries(0),
        Arc::new(NoopCallbacks),
        None,
        None,
    );

    assert_ne!(first.session_id(), second.session_id());

    tokio::join!(first.stop(), second.stop());
}

/// A binary send before any connection exists fails the same way a text send
/// does: immediately, with `ConnectionLost`, never blocking on a retry.
#[tokio::test]
async fn binary_send_without_connection_fails_fast() {
    let config = ClientConfig::new("ws://127.0.0.1:1").with_max_fast_retries(0);
    let client = WsClient::spawn(config, Arc::new(NoopCallbacks), None, None);

    let err = client.send_binary(&[1, 2, 3]).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConnectionLost);

    client.stop().await;
}
