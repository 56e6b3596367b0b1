use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::Result;
use crate::tcp::TelemetryStream;

/// Cooperative shutdown shared between a reader and whoever stops it.
///
/// Triggering sets a flag checked between frames and shuts down every
/// registered stream, so a read blocked on the network returns promptly.
/// A registration lasts as long as the [`Registration`] guard it returns.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    triggered: AtomicBool,
    next_id: AtomicU64,
    streams: Mutex<Vec<(u64, TelemetryStream)>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        if self.inner.triggered.swap(true, Ordering::SeqCst) {
            return;
        }
        let streams = std::mem::take(&mut *self.lock_streams());
        debug!(streams = streams.len(), "shutdown requested");
        for (_, stream) in streams {
            if let Err(err) = stream.shutdown() {
                debug!(peer = %stream.peer_addr(), error = %err, "stream shutdown failed");
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Tie `stream` to this signal until the returned guard is dropped. If
    /// shutdown was already requested the stream is closed immediately.
    ///
    /// The signal keeps its own handle to the socket, so the connection is
    /// only released once the guard is gone too.
    #[must_use = "dropping the guard unregisters the stream"]
    pub fn register(&self, stream: &TelemetryStream) -> Result<Registration> {
        let handle = stream.try_clone()?;
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let registration = Registration {
            signal: self.clone(),
            id,
        };

        let mut streams = self.lock_streams();
        if self.is_triggered() {
            drop(streams);
            handle.shutdown()?;
            return Ok(registration);
        }
        streams.push((id, handle));
        Ok(registration)
    }

    fn lock_streams(&self) -> MutexGuard<'_, Vec<(u64, TelemetryStream)>> {
        self.inner
            .streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a stream registered with a [`ShutdownSignal`].
///
/// Dropping it removes the signal's handle, closing that descriptor.
pub struct Registration {
    signal: ShutdownSignal,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut streams = self.signal.lock_streams();
        let before = streams.len();
        streams.retain(|(id, _)| *id != self.id);
        if streams.len() < before {
            debug!(id = self.id, "stream unregistered from shutdown");
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}

impl std::fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("triggered", &self.is_triggered())
            .finish()
    }
}
