//! The two data-transfer pumps
//!
//! The inbound pump copies socket bytes into the inbound pipe and lives
//! exactly as long as a connection; the accept loop awaits it. The outbound
//! pump drains the outbound pipe for the whole bridge lifetime, shipping
//! chunks to the connected client or parking them in the ring cache while
//! disconnected.
//!
//! Both pumps bound their blocking operations with the bridge timeout, so a
//! stalled consumer or a wedged socket can delay a single iteration but
//! never wedge a pump.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::BridgeInner;
use crate::io::RingBuffer;

/// Read buffer size for the socket side of the inbound pump
const INBOUND_READ_BUFFER: usize = 8 * 1024;

/// Outcome of one connected send iteration of the outbound pump
enum SendOutcome {
    Sent,
    TimedOut,
    Failed(io::Error),
    Cancelled,
}

/// Copy bytes from the socket into the inbound pipe until FIN or cancel
///
/// Each received block is committed to the pipe unconditionally (committed
/// bytes are always delivered) and then flushed under a deadline loaded
/// fresh from the runtime-mutable bridge timeout. A flush that exceeds the
/// deadline is abandoned; the loop proceeds to the next socket read so a
/// stalled local consumer cannot block the remote peer indefinitely.
pub(crate) async fn inbound_pump(
    mut remote: OwnedReadHalf,
    inner: &BridgeInner,
) -> io::Result<()> {
    let mut buf = vec![0u8; INBOUND_READ_BUFFER];
    loop {
        let n = tokio::select! {
            read = remote.read(&mut buf) => read?,
            () = inner.cancel.cancelled() => return Ok(()),
        };
        if n == 0 {
            trace!("remote peer closed the connection");
            return Ok(());
        }
        inner.inbound.push(Bytes::copy_from_slice(&buf[..n]));

        let deadline = inner.bridge_timeout();
        tokio::select! {
            flushed = time::timeout(deadline, inner.inbound.flush()) => {
                if flushed.is_err() {
                    trace!(bytes = n, "inbound flush timed out, consumer is stalled");
                }
            }
            () = inner.cancel.cancelled() => return Ok(()),
        }
    }
}

/// Drain the outbound pipe for the lifetime of the bridge
///
/// The pipe read races against the connection-established signal so a fresh
/// connection gets the cached bytes without waiting for the next produced
/// chunk, and against the pump's cancellation token. Every chunk is
/// acknowledged in full each iteration; whatever could not be sent lands in
/// the ring and precedes later production on the wire.
pub(crate) async fn outbound_pump(inner: Arc<BridgeInner>, cancel: CancellationToken) {
    let mut ring = RingBuffer::new(inner.config.outgoing_cache_bytes);
    loop {
        let chunk = tokio::select! {
            chunk = inner.outbound.read_chunk() => match chunk {
                Some(chunk) => Some(chunk),
                // Pipe completed: nothing more will ever be produced
                None => break,
            },
            () = inner.remote.established() => None,
            () = cancel.cancelled() => break,
        };

        let mut slot = inner.remote.lock().await;
        let Some(socket) = slot.as_mut() else {
            drop(slot);
            if let Some(chunk) = chunk {
                let dropped = ring.accumulate(&chunk);
                if dropped > 0 {
                    trace!(dropped, "outgoing cache evicted oldest bytes");
                }
            }
            continue;
        };

        let deadline = inner.bridge_timeout();
        let mut consumed = 0usize;
        let outcome = {
            let transfer = transmit(socket, &mut ring, chunk.as_ref(), &mut consumed);
            tokio::pin!(transfer);
            tokio::select! {
                sent = &mut transfer => match sent {
                    Ok(()) => SendOutcome::Sent,
                    Err(err) => SendOutcome::Failed(err),
                },
                () = time::sleep(deadline) => SendOutcome::TimedOut,
                () = cancel.cancelled() => SendOutcome::Cancelled,
            }
        };
        drop(slot);

        // Un-sent remainder of the chunk carries over through the ring
        if let Some(chunk) = &chunk {
            if consumed < chunk.len() {
                let dropped = ring.accumulate(&chunk[consumed..]);
                if dropped > 0 {
                    trace!(dropped, "outgoing cache evicted oldest bytes");
                }
            }
        }

        match outcome {
            SendOutcome::Sent => {}
            SendOutcome::TimedOut => {
                trace!("outbound send abandoned after timeout, remainder cached");
            }
            SendOutcome::Failed(err) => {
                debug!(error = %err, "send to remote failed, remainder cached");
            }
            SendOutcome::Cancelled => break,
        }
    }
    trace!("outbound pump stopped");
}

/// Flush the ring, then the current chunk, to the connected client
///
/// Ring bytes are consumed span by span as each write completes, so an
/// abandoned transfer never duplicates already-delivered bytes. The chunk
/// progress is reported through `consumed` for the same reason: the caller
/// reads it even when this future is dropped at the deadline.
async fn transmit(
    socket: &mut OwnedWriteHalf,
    ring: &mut RingBuffer,
    chunk: Option<&Bytes>,
    consumed: &mut usize,
) -> io::Result<()> {
    while !ring.is_empty() {
        let n = {
            let (first, _) = ring.spans();
            socket.write(first).await?
        };
        if n == 0 {
            return Err(io::ErrorKind::WriteZero.into());
        }
        ring.consume(n);
    }

    if let Some(chunk) = chunk {
        while *consumed < chunk.len() {
            let n = socket.write(&chunk[*consumed..]).await?;
            if n == 0 {
                return Err(io::ErrorKind::WriteZero.into());
            }
            *consumed += n;
        }
    }
    Ok(())
}
