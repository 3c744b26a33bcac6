//! Externally visible stream handles
//!
//! [`Incoming`] and [`Outgoing`] are the two endpoints a local application
//! holds for the lifetime of the bridge. They are plain `AsyncRead` /
//! `AsyncWrite` adapters over the bridge's pipes: remote connection churn
//! never surfaces through them.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::io::BytePipe;

/// Read-only byte stream carrying everything received from remote clients
///
/// Bytes arrive in the order the current client sent them; bytes from an
/// earlier connection that are still buffered are delivered before anything
/// a later connection sends. Reads return `Ok(0)` only after the bridge has
/// been shut down and the buffered data has drained.
#[derive(Debug)]
pub struct Incoming {
    pipe: BytePipe,
}

impl Incoming {
    pub(crate) fn new(pipe: BytePipe) -> Self {
        Self { pipe }
    }
}

impl AsyncRead for Incoming {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.pipe.poll_read(cx, buf)
    }
}

/// Write-only byte stream feeding the current (or a future) remote client
///
/// Writes suspend while the outbound pipe is above its pause threshold and
/// fail with `BrokenPipe` once the bridge has been shut down. Shutting the
/// handle down completes the outbound pipe, which in turn stops the
/// outbound pump after it drains.
#[derive(Debug)]
pub struct Outgoing {
    pipe: BytePipe,
}

impl Outgoing {
    pub(crate) fn new(pipe: BytePipe) -> Self {
        Self { pipe }
    }
}

impl AsyncWrite for Outgoing {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.pipe.poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.pipe.poll_flush(cx).map(Ok)
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.pipe.close_writer();
        Poll::Ready(Ok(()))
    }
}
