//! Shared slot for the currently connected remote client
//!
//! The accept loop binds the write half of each accepted socket here; the
//! outbound pump is the only other party that touches the slot. Binding
//! also raises the connection-established signal, which the pump races
//! against its pipe read so it can flush the outgoing cache to a fresh
//! connection without waiting for the next produced chunk.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, MutexGuard, Notify};

/// Coordination point between the accept loop and the outbound pump
#[derive(Debug, Default)]
pub(crate) struct RemoteContext {
    slot: Mutex<Option<OwnedWriteHalf>>,
    connected: AtomicBool,
    established: Notify,
}

impl RemoteContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Bind a freshly accepted client and raise the established signal
    ///
    /// `notify_one` stores a permit when the pump is not currently waiting,
    /// so a connection established mid-iteration is still observed at the
    /// pump's next pipe read. A stale permit from an earlier connection
    /// costs one spurious wakeup at most.
    pub(crate) async fn bind(&self, remote: OwnedWriteHalf) {
        *self.slot.lock().await = Some(remote);
        self.connected.store(true, Ordering::Release);
        self.established.notify_one();
    }

    /// Clear the slot, dropping (and thereby closing) the write half
    pub(crate) async fn unbind(&self) {
        self.connected.store(false, Ordering::Release);
        self.slot.lock().await.take();
    }

    /// Whether a client is currently bound
    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Lock the slot for the duration of a send iteration
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Option<OwnedWriteHalf>> {
        self.slot.lock().await
    }

    /// Wait for the next connection-established signal
    pub(crate) async fn established(&self) {
        self.established.notified().await;
    }
}
