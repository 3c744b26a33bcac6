//! Persistent TCP-to-stream bridge
//!
//! A [`Bridge`] exposes two local byte streams that stay valid for its whole
//! lifetime — [`Incoming`] (read) and [`Outgoing`] (write) — while operating
//! a single-client TCP listener underneath. Whichever client is currently
//! connected is wired to those streams; while nobody is, outbound bytes are
//! parked in a fixed-capacity ring cache and inbound delivery simply pauses.
//! A reconnecting peer resumes bridging transparently.
//!
//! # Architecture
//!
//! ```text
//! producer → Outgoing → outbound pipe → outbound pump → socket | ring → TCP
//! consumer ← Incoming ← inbound pipe  ← inbound pump  ← socket       ← TCP
//! ```
//!
//! Three tasks cooperate: the accept loop (serves one client at a time and
//! runs the inbound pump per connection), the outbound pump (runs for the
//! bridge lifetime), and whatever local tasks drive the stream handles.
//!
//! # Example
//!
//! ```no_run
//! use stream_bridge::{Bridge, BridgeConfig};
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut bridge = Bridge::new("127.0.0.1:9001".parse()?, BridgeConfig::default())?;
//! let mut incoming = bridge.take_incoming().expect("first take");
//! let mut outgoing = bridge.take_outgoing().expect("first take");
//!
//! outgoing.write_all(b"hello").await?; // cached until a client connects
//!
//! let mut buf = [0u8; 1024];
//! let n = incoming.read(&mut buf).await?; // bytes from whichever client shows up
//! # let _ = n;
//! bridge.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod accept;
mod pump;
mod remote;
mod stream;

pub use stream::{Incoming, Outgoing};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{BridgeConfig, MIN_BRIDGE_TIMEOUT_MS};
use crate::error::Result;
use crate::io::{BytePipe, DEFAULT_PAUSE_THRESHOLD};
use self::remote::RemoteContext;

/// State shared between the bridge handle and its tasks
#[derive(Debug)]
pub(crate) struct BridgeInner {
    pub(crate) endpoint: SocketAddr,
    pub(crate) config: BridgeConfig,
    accept_interval_ms: AtomicU64,
    bridge_timeout_ms: AtomicU64,
    pub(crate) last_socket_error: AtomicI32,
    pub(crate) remote: RemoteContext,
    pub(crate) inbound: BytePipe,
    pub(crate) outbound: BytePipe,
    pub(crate) cancel: CancellationToken,
}

impl BridgeInner {
    /// Current accept interval; re-read on every loop iteration so runtime
    /// mutation takes effect by the next attempt
    pub(crate) fn accept_interval(&self) -> Duration {
        Duration::from_millis(self.accept_interval_ms.load(Ordering::Relaxed))
    }

    /// Current flush/send deadline; re-read per operation
    pub(crate) fn bridge_timeout(&self) -> Duration {
        Duration::from_millis(self.bridge_timeout_ms.load(Ordering::Relaxed))
    }
}

/// Long-lived bridge between a local stream pair and a transient TCP client
///
/// See the [module documentation](self) for the data flow. Connection churn
/// is invisible to the stream handles; the only connectivity signal exposed
/// is [`last_socket_error`](Bridge::last_socket_error).
#[derive(Debug)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
    incoming: Option<Incoming>,
    outgoing: Option<Outgoing>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl Bridge {
    /// Create a bridge listening at `endpoint` and start its tasks
    ///
    /// Values in `config` below their published minimums are clamped up.
    /// The listener itself is created lazily by the accept loop, so an
    /// endpoint that cannot be bound yet is retried on the accept interval
    /// rather than reported here.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a size field exceeds the supported
    /// range.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(endpoint: SocketAddr, config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        let config = config.normalized();

        let pause_threshold = config
            .pause_writer_threshold_bytes
            .unwrap_or(DEFAULT_PAUSE_THRESHOLD);
        let inbound = BytePipe::new(pause_threshold);
        let outbound = BytePipe::new(pause_threshold);

        let inner = Arc::new(BridgeInner {
            endpoint,
            accept_interval_ms: AtomicU64::new(config.accept_interval_ms),
            bridge_timeout_ms: AtomicU64::new(config.bridge_timeout_ms),
            config,
            last_socket_error: AtomicI32::new(0),
            remote: RemoteContext::new(),
            inbound: inbound.clone(),
            outbound: outbound.clone(),
            cancel: CancellationToken::new(),
        });

        let accept_task = tokio::spawn(accept::accept_loop(Arc::clone(&inner)));
        info!(endpoint = %endpoint, "bridge started");

        Ok(Self {
            inner,
            incoming: Some(Incoming::new(inbound)),
            outgoing: Some(Outgoing::new(outbound)),
            accept_task: Mutex::new(Some(accept_task)),
            disposed: AtomicBool::new(false),
        })
    }

    /// The configured listen endpoint
    #[must_use]
    pub fn endpoint(&self) -> SocketAddr {
        self.inner.endpoint
    }

    /// Take the read-only inbound stream handle
    ///
    /// Returns `None` after the first call; the pipe has a single consumer.
    pub fn take_incoming(&mut self) -> Option<Incoming> {
        self.incoming.take()
    }

    /// Take the write-only outbound stream handle
    ///
    /// Returns `None` after the first call; the pipe has a single producer.
    pub fn take_outgoing(&mut self) -> Option<Outgoing> {
        self.outgoing.take()
    }

    /// Delay between accept attempts
    #[must_use]
    pub fn accept_interval(&self) -> Duration {
        self.inner.accept_interval()
    }

    /// Change the accept interval; effective by the next loop iteration
    pub fn set_accept_interval(&self, interval: Duration) {
        let ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.inner.accept_interval_ms.store(ms, Ordering::Relaxed);
    }

    /// Deadline for a single flush/send operation
    #[must_use]
    pub fn bridge_timeout(&self) -> Duration {
        self.inner.bridge_timeout()
    }

    /// Change the flush/send deadline; clamped to the published minimum and
    /// effective for the next operation
    pub fn set_bridge_timeout(&self, timeout: Duration) {
        let ms = u64::try_from(timeout.as_millis())
            .unwrap_or(u64::MAX)
            .max(MIN_BRIDGE_TIMEOUT_MS);
        self.inner.bridge_timeout_ms.store(ms, Ordering::Relaxed);
    }

    /// Last non-success error code from the accept/listen path
    ///
    /// `0` means none, a positive value is the platform socket error code,
    /// `-1` marks a non-socket error.
    #[must_use]
    pub fn last_socket_error(&self) -> i32 {
        self.inner.last_socket_error.load(Ordering::Relaxed)
    }

    /// Whether a remote client is currently bound
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.remote.is_connected()
    }

    /// Shut the bridge down: cancel the tasks and complete both pipes
    ///
    /// Single-shot and idempotent: only the first caller performs the work,
    /// concurrent and repeated calls return immediately. Afterwards the
    /// inbound stream drains to EOF and outbound writes fail with
    /// `BrokenPipe`.
    pub async fn shutdown(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.cancel.cancel();

        let task = self.accept_task.lock().take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                debug!(error = %err, "accept loop task failed during shutdown");
            }
        }

        self.inner.outbound.close();
        self.inner.inbound.close();
        debug!(endpoint = %self.inner.endpoint, "bridge shut down");
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        // Best-effort backstop for bridges dropped without shutdown()
        if !self.disposed.load(Ordering::SeqCst) {
            self.inner.cancel.cancel();
        }
    }
}
