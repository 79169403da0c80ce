use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Notify, Semaphore};

use crate::host::sink::DirectorySink;

/// Writes encoded frames to a session's sink with at most `limit` writes in flight.
///
/// `submit` waits for a free slot (backpressure), then spawns the write and returns without
/// waiting for it. Completion order is unspecified. A limit of 0 disables the bound.
///
/// The sink lives in a slot shared by all writes of the session. After [`WriteScheduler::release`]
/// empties the slot, writes that have not reached the sink yet are dropped silently.
#[derive(Clone)]
pub struct WriteScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    limit: usize,
    permits: Option<Arc<Semaphore>>,
    in_flight: AtomicUsize,
    idle: Notify,
    sink: Mutex<Option<Arc<dyn DirectorySink>>>,
}

/// Accounts for one accepted write; dropping it marks the write finished.
struct InFlight(Arc<Inner>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.0.idle.notify_waiters();
    }
}

impl WriteScheduler {
    /// Create a scheduler writing into `sink`, bounded to `limit` concurrent writes.
    pub fn new(limit: usize, sink: Arc<dyn DirectorySink>) -> Self {
        let permits = (limit > 0).then(|| Arc::new(Semaphore::new(limit)));
        Self {
            inner: Arc::new(Inner {
                limit,
                permits,
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
                sink: Mutex::new(Some(sink)),
            }),
        }
    }

    /// Configured bound on concurrent writes (0 = unbounded).
    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    /// Writes accepted but not finished yet.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// `true` until the sink is released.
    pub fn is_attached(&self) -> bool {
        self.inner.sink().is_some()
    }

    /// Detach the sink, returning it the first time only.
    pub fn release(&self) -> Option<Arc<dyn DirectorySink>> {
        self.inner
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Queue `bytes` to be written as `name`.
    ///
    /// Suspends while `limit` writes are in flight. Once accepted the write runs on its own task;
    /// failures are logged and never returned here.
    pub async fn submit(&self, name: String, bytes: Vec<u8>) {
        let permit = match &self.inner.permits {
            Some(sem) => match Arc::clone(sem).acquire_owned().await {
                Ok(permit) => Some(permit),
                // The semaphore is never closed.
                Err(_) => return,
            },
            None => None,
        };

        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight(Arc::clone(&self.inner));
        tokio::spawn(async move {
            let _permit = permit;
            guard.0.write(&name, &bytes).await;
            drop(guard);
        });
    }

    /// Wait until every accepted write has finished.
    pub async fn drain(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Inner {
    fn sink(&self) -> Option<Arc<dyn DirectorySink>> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn write(&self, name: &str, bytes: &[u8]) {
        let Some(sink) = self.sink() else {
            tracing::debug!(file = name, "sink released, dropping frame write");
            return;
        };
        match sink.write_entry(name, bytes).await {
            Ok(()) => tracing::debug!(file = name, bytes = bytes.len(), "wrote frame"),
            Err(e) => tracing::warn!(
                file = name,
                sink = %sink.describe(),
                error = %e,
                "frame write failed"
            ),
        }
    }
}

impl std::fmt::Debug for WriteScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteScheduler")
            .field("limit", &self.limit())
            .field("in_flight", &self.in_flight())
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/scheduler.rs"]
mod tests;
