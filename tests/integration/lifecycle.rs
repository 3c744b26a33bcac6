//! Bridge lifecycle: shutdown semantics and error reporting

use std::time::Duration;

use stream_bridge::{Bridge, BridgeConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;

use super::{connect_with_retry, reserve_endpoint};

fn fast_config() -> BridgeConfig {
    BridgeConfig::new()
        .with_accept_interval_ms(100)
        .with_bridge_timeout_ms(500)
}

#[tokio::test]
async fn test_shutdown_terminates_everything() {
    let endpoint = reserve_endpoint();
    let mut bridge = Bridge::new(endpoint, fast_config()).unwrap();
    let mut incoming = bridge.take_incoming().unwrap();
    let mut outgoing = bridge.take_outgoing().unwrap();

    let mut client = connect_with_retry(endpoint).await;
    client.write_all(b"pre-shutdown").await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    bridge.shutdown().await;
    assert!(!bridge.is_connected());

    // The remote socket is gone: the client observes EOF or an error
    let mut buf = [0u8; 64];
    match timeout(Duration::from_secs(5), client.read(&mut buf)).await {
        Ok(Ok(0) | Err(_)) => {}
        Ok(Ok(n)) => panic!("unexpected {n} bytes after shutdown"),
        Err(elapsed) => panic!("client read did not resolve: {elapsed}"),
    }

    // Local quiescence: no new bytes produced, no new bytes accepted
    assert_eq!(incoming.read(&mut buf).await.unwrap(), 0);
    assert!(outgoing.write_all(b"late").await.is_err());
}

#[tokio::test]
async fn test_shutdown_twice_returns_immediately() {
    let bridge = Bridge::new(reserve_endpoint(), fast_config()).unwrap();
    bridge.shutdown().await;

    // The second call must not re-run the teardown (which takes >500ms)
    timeout(Duration::from_millis(100), bridge.shutdown())
        .await
        .expect("repeated shutdown should be a no-op");
}

#[tokio::test]
async fn test_listen_failure_is_recorded_not_raised() {
    let endpoint = reserve_endpoint();
    // Occupy the endpoint so the bridge's listener cannot bind
    let _occupant = TcpListener::bind(endpoint).await.unwrap();

    let bridge = Bridge::new(endpoint, fast_config()).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // A platform error code, not a panic and not an error to the caller
    assert!(bridge.last_socket_error() > 0);

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_error_code_clears_on_successful_accept() {
    let endpoint = reserve_endpoint();
    let occupant = TcpListener::bind(endpoint).await.unwrap();

    let bridge = Bridge::new(endpoint, fast_config()).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(bridge.last_socket_error() > 0);

    // Release the endpoint; the next accept cycle clears the code
    drop(occupant);
    let _client = connect_with_retry(endpoint).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(bridge.last_socket_error(), 0);

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_runtime_option_changes_take_effect() {
    let endpoint = reserve_endpoint();
    let bridge = Bridge::new(
        endpoint,
        BridgeConfig::new().with_accept_interval_ms(60_000),
    )
    .unwrap();

    // First accept happens before any interval sleep
    let first = connect_with_retry(endpoint).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // With a 60s interval a reconnect would hang. The interval is loaded
    // fresh each iteration, so shrinking it now applies to the sleep that
    // follows the disconnect below.
    bridge.set_accept_interval(Duration::from_millis(50));
    drop(first);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let _second = timeout(Duration::from_secs(5), connect_with_retry(endpoint))
        .await
        .expect("runtime interval change should apply to the next cycle");

    bridge.shutdown().await;
}
