//! Integration tests for stream-bridge
//!
//! These tests drive a real bridge against real loopback sockets and cover
//! the end-to-end behavior of both directions plus the lifecycle:
//!
//! - `inbound`: socket-to-stream delivery, reconnects, backpressured bulk
//! - `outbound`: stream-to-socket delivery, offline caching, ring eviction
//! - `lifecycle`: shutdown semantics and error reporting
//!
//! # Test Organization
//!
//! Every test reserves its own loopback port: the bridge rebinds its
//! configured endpoint for each connection, so OS-assigned ports cannot be
//! used and parallel tests must not share one.

pub mod lifecycle;
pub mod outbound;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

static NEXT_PORT: AtomicU16 = AtomicU16::new(39400);

/// Install a test-writer subscriber; a no-op after the first call
///
/// Run with e.g. `RUST_LOG=stream_bridge=trace cargo test --test
/// integration_tests -- --nocapture` to see the bridge's tracing output.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Reserve a loopback endpoint unique to the calling test
///
/// Every test starts here, which makes it the shared setup point for the
/// tracing subscriber as well.
pub fn reserve_endpoint() -> SocketAddr {
    init_tracing();
    let port = NEXT_PORT.fetch_add(1, Ordering::Relaxed);
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Connect to the bridge, retrying while its listener (re)binds
pub async fn connect_with_retry(addr: SocketAddr) -> TcpStream {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => return stream,
            Err(err) => {
                assert!(Instant::now() < deadline, "could not connect to {addr}: {err}");
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}

/// Random binary payload of the given length
pub fn random_payload(len: usize) -> Vec<u8> {
    use rand::RngCore;

    let mut data = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}
