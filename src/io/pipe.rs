//! Bounded single-producer single-consumer byte pipe
//!
//! This module provides [`BytePipe`], the in-memory queue that decouples the
//! bridge's pumps from the externally visible stream handles. The pipe
//! accepts committed bytes unconditionally and applies backpressure through
//! its flush/write paths: once the amount of buffered data exceeds the pause
//! threshold, writers suspend until the reader drains back below it.
//!
//! Each pipe has exactly one writer task and one reader task. Neither side
//! holds the internal lock across a suspension point; wakers are parked in
//! the shared state and fired after the lock is released.

use std::collections::VecDeque;
use std::future::poll_fn;
use std::io;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use bytes::{Buf, Bytes};
use parking_lot::Mutex;
use tokio::io::ReadBuf;

/// Pause threshold applied when the configuration leaves it unset (64 KiB)
pub const DEFAULT_PAUSE_THRESHOLD: usize = 64 * 1024;

/// Bounded byte pipe with pause-threshold backpressure
///
/// Cloning the pipe clones a handle to the same shared queue; the bridge
/// hands one clone to a pump and one to the corresponding stream handle.
#[derive(Debug, Clone)]
pub struct BytePipe {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    pause_threshold: usize,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    chunks: VecDeque<Bytes>,
    buffered: usize,
    writer_closed: bool,
    reader_closed: bool,
    read_waker: Option<Waker>,
    write_waker: Option<Waker>,
}

impl BytePipe {
    /// Create a pipe that pauses its writer above `pause_threshold` bytes
    #[must_use]
    pub fn new(pause_threshold: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                pause_threshold,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Number of bytes currently buffered
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.shared.state.lock().buffered
    }

    /// The configured pause threshold in bytes
    #[must_use]
    pub fn pause_threshold(&self) -> usize {
        self.shared.pause_threshold
    }

    /// Commit a chunk into the pipe
    ///
    /// Commits always succeed: once a chunk is pushed its bytes will be
    /// delivered to the reader, threshold or not. After the reader side has
    /// been closed the chunk is silently discarded.
    pub fn push(&self, data: Bytes) {
        if data.is_empty() {
            return;
        }
        let waker = {
            let mut state = self.shared.state.lock();
            if state.reader_closed {
                return;
            }
            state.buffered += data.len();
            state.chunks.push_back(data);
            state.read_waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Wait until the buffered amount drains to the pause threshold
    ///
    /// Resolves immediately when the reader side is closed; there is nothing
    /// left to wait for in that case.
    pub async fn flush(&self) {
        poll_fn(|cx| self.poll_flush(cx)).await;
    }

    pub(crate) fn poll_flush(&self, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.shared.state.lock();
        if state.reader_closed || state.buffered <= self.shared.pause_threshold {
            return Poll::Ready(());
        }
        state.write_waker = Some(cx.waker().clone());
        Poll::Pending
    }

    /// Write `buf` into the pipe, suspending while above the threshold
    pub(crate) fn poll_write(&self, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let waker = {
            let mut state = self.shared.state.lock();
            if state.writer_closed || state.reader_closed {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "byte pipe closed",
                )));
            }
            if state.buffered > self.shared.pause_threshold {
                state.write_waker = Some(cx.waker().clone());
                return Poll::Pending;
            }
            if buf.is_empty() {
                return Poll::Ready(Ok(0));
            }
            state.buffered += buf.len();
            state.chunks.push_back(Bytes::copy_from_slice(buf));
            state.read_waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        Poll::Ready(Ok(buf.len()))
    }

    /// Fill `buf` from as many queued chunks as fit
    ///
    /// Returns `Ready(Ok(()))` with nothing filled once the writer side is
    /// closed and the queue has drained (end of stream).
    pub(crate) fn poll_read(
        &self,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let waker = {
            let mut state = self.shared.state.lock();
            if state.chunks.is_empty() {
                if state.writer_closed {
                    return Poll::Ready(Ok(()));
                }
                state.read_waker = Some(cx.waker().clone());
                return Poll::Pending;
            }
            while buf.remaining() > 0 {
                let Some(front) = state.chunks.front_mut() else {
                    break;
                };
                let take = front.len().min(buf.remaining());
                buf.put_slice(&front[..take]);
                let front_len = front.len();
                if take == front_len {
                    state.chunks.pop_front();
                } else {
                    state.chunks.front_mut().unwrap().advance(take);
                }
                state.buffered -= take;
            }
            if state.buffered <= self.shared.pause_threshold {
                state.write_waker.take()
            } else {
                None
            }
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        Poll::Ready(Ok(()))
    }

    /// Take the next queued chunk
    ///
    /// Returns `None` once the writer side is closed and the queue has
    /// drained. Cancel-safe: a chunk is only removed when the future
    /// resolves.
    pub async fn read_chunk(&self) -> Option<Bytes> {
        poll_fn(|cx| self.poll_read_chunk(cx)).await
    }

    pub(crate) fn poll_read_chunk(&self, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        let (chunk, waker) = {
            let mut state = self.shared.state.lock();
            match state.chunks.pop_front() {
                Some(chunk) => {
                    state.buffered -= chunk.len();
                    let waker = if state.buffered <= self.shared.pause_threshold {
                        state.write_waker.take()
                    } else {
                        None
                    };
                    (chunk, waker)
                }
                None if state.writer_closed => return Poll::Ready(None),
                None => {
                    state.read_waker = Some(cx.waker().clone());
                    return Poll::Pending;
                }
            }
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        Poll::Ready(Some(chunk))
    }

    /// Close the writer side; the reader drains what is queued, then EOF
    pub fn close_writer(&self) {
        let waker = {
            let mut state = self.shared.state.lock();
            state.writer_closed = true;
            state.read_waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Close the reader side; queued data is dropped and writes start failing
    pub fn close_reader(&self) {
        let waker = {
            let mut state = self.shared.state.lock();
            state.reader_closed = true;
            state.chunks.clear();
            state.buffered = 0;
            state.write_waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Complete both endpoints
    pub fn close(&self) {
        let wakers = {
            let mut state = self.shared.state.lock();
            state.writer_closed = true;
            state.reader_closed = true;
            state.chunks.clear();
            state.buffered = 0;
            (state.read_waker.take(), state.write_waker.take())
        };
        if let Some(waker) = wakers.0 {
            waker.wake();
        }
        if let Some(waker) = wakers.1 {
            waker.wake();
        }
    }
}
