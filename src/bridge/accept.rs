//! Single-client accept loop
//!
//! One listener, one client at a time. The listener is created fresh for
//! every connection attempt and torn down afterwards, so a configured
//! endpoint that is temporarily unavailable simply retries on the accept
//! interval. Connectivity failures never leave this module: they are
//! recorded in `last_socket_error` and the loop carries on.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol, SockRef, Socket, Type};
use tokio::net::{TcpListener, TcpStream};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::pump::{inbound_pump, outbound_pump};
use super::BridgeInner;
use crate::config::BridgeConfig;

/// Grace period after the accept loop stops, letting a peer shutdown
/// deliver its last bytes before the outbound pump is cancelled
const SHUTDOWN_LINGER: Duration = Duration::from_millis(500);

/// A single client is served at a time; further connects queue in the OS
const LISTEN_BACKLOG: i32 = 1;

/// Run the accept loop until the bridge is cancelled
///
/// Owns the outbound pump for the whole bridge lifetime: the pump starts
/// before the first listen attempt and is cancelled (after a short linger)
/// once the loop exits. The pump gets its own token rather than a child of
/// the bridge token: bridge cancellation must not reach the pump until the
/// linger has passed, or bytes still deliverable during the grace window
/// would be stranded in the cache.
pub(crate) async fn accept_loop(inner: Arc<BridgeInner>) {
    let pump_cancel = CancellationToken::new();
    let pump = tokio::spawn(outbound_pump(Arc::clone(&inner), pump_cancel.clone()));

    while !inner.cancel.is_cancelled() {
        if let Err(err) = serve_connection(&inner).await {
            let code = err.raw_os_error().unwrap_or(-1);
            inner.last_socket_error.store(code, Ordering::Relaxed);
            debug!(error = %err, code, "bridge connection ended with error");
        }
        if inner.cancel.is_cancelled() {
            break;
        }

        let interval = inner.accept_interval();
        if !interval.is_zero() {
            tokio::select! {
                () = time::sleep(interval) => {}
                () = inner.cancel.cancelled() => break,
            }
        }
    }

    time::sleep(SHUTDOWN_LINGER).await;
    pump_cancel.cancel();
    if let Err(err) = pump.await {
        warn!(error = %err, "outbound pump task failed");
    }
    trace!("accept loop stopped");
}

/// Listen, accept one client, and bridge it until it goes away
async fn serve_connection(inner: &BridgeInner) -> io::Result<()> {
    let listener = bind_listener(inner.endpoint)?;
    let (stream, peer) = tokio::select! {
        accepted = listener.accept() => accepted?,
        () = inner.cancel.cancelled() => return Ok(()),
    };

    configure_stream(&stream, &inner.config)?;
    inner.last_socket_error.store(0, Ordering::Relaxed);
    debug!(peer = %peer, "remote client connected");

    let (read_half, write_half) = stream.into_split();
    inner.remote.bind(write_half).await;
    let result = inbound_pump(read_half, inner).await;
    inner.remote.unbind().await;
    debug!(peer = %peer, "remote client detached");
    result
}

/// Create the listener with an explicit backlog of one
fn bind_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    // The listener is recreated for every connection; without SO_REUSEADDR
    // the previous socket's TIME_WAIT would block the rebind
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    TcpListener::from_std(socket.into())
}

/// Apply the configured socket options to an accepted stream
fn configure_stream(stream: &TcpStream, config: &BridgeConfig) -> io::Result<()> {
    stream.set_nodelay(true)?;
    let socket_ref = SockRef::from(stream);
    if let Some(bytes) = config.send_buffer_bytes {
        socket_ref.set_send_buffer_size(bytes)?;
    }
    if let Some(bytes) = config.recv_buffer_bytes {
        socket_ref.set_recv_buffer_size(bytes)?;
    }
    Ok(())
}
