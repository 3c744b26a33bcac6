//! Outbound direction: local `Outgoing` stream to TCP client

use std::time::Duration;

use stream_bridge::{Bridge, BridgeConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

use super::{connect_with_retry, random_payload, reserve_endpoint};

fn fast_config() -> BridgeConfig {
    BridgeConfig::new()
        .with_accept_interval_ms(100)
        .with_bridge_timeout_ms(500)
}

#[tokio::test]
async fn test_outbound_same_session_then_reconnect() {
    let endpoint = reserve_endpoint();
    let mut bridge = Bridge::new(endpoint, fast_config()).unwrap();
    let mut outgoing = bridge.take_outgoing().unwrap();

    let mut client = connect_with_retry(endpoint).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    outgoing.write_all(b"abcdef").await.unwrap();
    outgoing.write_all(b"ABCDEF").await.unwrap();

    let mut buf = [0u8; 12];
    timeout(Duration::from_secs(5), client.read_exact(&mut buf))
        .await
        .expect("connected client should receive the writes")
        .unwrap();
    assert_eq!(&buf, b"abcdefABCDEF");

    drop(client);
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut client = connect_with_retry(endpoint).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    outgoing.write_all(b"vwxyz").await.unwrap();
    outgoing.write_all(b"VWXYZ").await.unwrap();

    let mut buf = [0u8; 10];
    timeout(Duration::from_secs(5), client.read_exact(&mut buf))
        .await
        .expect("reconnected client should receive the writes")
        .unwrap();
    assert_eq!(&buf, b"vwxyzVWXYZ");

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_outbound_buffered_while_disconnected() {
    let endpoint = reserve_endpoint();
    let mut bridge = Bridge::new(endpoint, fast_config()).unwrap();
    let mut outgoing = bridge.take_outgoing().unwrap();

    // No client yet: everything lands in the outgoing cache
    outgoing.write_all(b"abcdef").await.unwrap();
    outgoing.write_all(b"ABCDEF").await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    outgoing.write_all(b"vwxyz").await.unwrap();
    outgoing.write_all(b"VWXYZ").await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let mut client = connect_with_retry(endpoint).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Total is well under the default 4096-byte cache: nothing was dropped
    let mut buf = [0u8; 22];
    timeout(Duration::from_secs(5), client.read_exact(&mut buf))
        .await
        .expect("cached bytes should flush on connect")
        .unwrap();
    assert_eq!(&buf, b"abcdefABCDEFvwxyzVWXYZ");

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_outbound_ring_eviction_keeps_newest() {
    const BLOB: usize = 1024;
    const BLOBS: usize = 10;

    let endpoint = reserve_endpoint();
    let config = fast_config().with_outgoing_cache_bytes(BLOB);
    let mut bridge = Bridge::new(endpoint, config).unwrap();
    let mut outgoing = bridge.take_outgoing().unwrap();

    let payload = random_payload(BLOB * BLOBS);
    for blob in payload.chunks(BLOB) {
        outgoing.write_all(blob).await.unwrap();
    }
    // Let the pump park everything in the cache, evicting as it goes
    tokio::time::sleep(Duration::from_millis(500)).await;

    let mut client = connect_with_retry(endpoint).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Only the newest cache-full survives: the last blob of the stream
    let mut buf = vec![0u8; BLOB];
    timeout(Duration::from_secs(5), client.read_exact(&mut buf))
        .await
        .expect("cached tail should flush on connect")
        .unwrap();
    assert_eq!(buf, payload[payload.len() - BLOB..]);

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_outbound_cache_precedes_fresh_writes() {
    let endpoint = reserve_endpoint();
    let mut bridge = Bridge::new(endpoint, fast_config()).unwrap();
    let mut outgoing = bridge.take_outgoing().unwrap();

    outgoing.write_all(b"cached-").await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut client = connect_with_retry(endpoint).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    outgoing.write_all(b"fresh").await.unwrap();

    let mut buf = [0u8; 12];
    timeout(Duration::from_secs(5), client.read_exact(&mut buf))
        .await
        .expect("both cached and fresh bytes should arrive")
        .unwrap();
    assert_eq!(&buf, b"cached-fresh");

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_outbound_zero_capacity_cache_discards_offline_writes() {
    let endpoint = reserve_endpoint();
    let config = fast_config().with_outgoing_cache_bytes(0);
    let mut bridge = Bridge::new(endpoint, config).unwrap();
    let mut outgoing = bridge.take_outgoing().unwrap();

    outgoing.write_all(b"discarded").await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut client = connect_with_retry(endpoint).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    outgoing.write_all(b"live").await.unwrap();

    let mut buf = [0u8; 4];
    timeout(Duration::from_secs(5), client.read_exact(&mut buf))
        .await
        .expect("live bytes should still arrive")
        .unwrap();
    assert_eq!(&buf, b"live");

    bridge.shutdown().await;
}
