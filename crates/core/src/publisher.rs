//! Chunk writes with overload-aware retry.
//!
//! A write moves `Pending -> Sending` and ends in `Success` or `Failed`. An
//! overload answer sends it through `Waiting` back to `Sending`, as many times as
//! the backend keeps refusing. The wait duration is shared by every write of the
//! run and only grows.

use crate::traits::DocumentStore;
use crate::{ChunkDocument, StoreError};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Run-wide wait applied when the backend reports overload.
#[derive(Debug)]
pub struct BackoffPolicy {
    current_ms: AtomicU64,
}

impl BackoffPolicy {
    pub fn new(initial: Duration) -> Self {
        let initial_ms = millis(initial).max(1);
        Self {
            current_ms: AtomicU64::new(initial_ms),
        }
    }

    pub fn current(&self) -> Duration {
        Duration::from_millis(self.current_ms.load(Ordering::SeqCst))
    }

    /// Doubles the shared duration and returns the new value.
    pub fn grow(&self) -> Duration {
        let previous = self
            .current_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |ms| {
                Some(ms.saturating_mul(2))
            })
            .unwrap_or_else(|ms| ms);
        Duration::from_millis(previous.saturating_mul(2))
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Counts publishes that have started and not yet finished.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    inner: Arc<InFlightInner>,
}

#[derive(Debug, Default)]
struct InFlightInner {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    pub fn register(&self) -> InFlightGuard {
        self.inner.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.inner.count.load(Ordering::SeqCst)
    }

    /// Resolves once every registered publish has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[must_use]
pub struct InFlightGuard {
    inner: Arc<InFlightInner>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.inner.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

pub struct IndexPublisher<S> {
    store: Arc<S>,
    backoff: Arc<BackoffPolicy>,
    in_flight: InFlight,
}

impl<S> IndexPublisher<S>
where
    S: DocumentStore + Send + Sync,
{
    pub fn new(store: Arc<S>, backoff: Arc<BackoffPolicy>) -> Self {
        Self {
            store,
            backoff,
            in_flight: InFlight::default(),
        }
    }

    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Upserts one chunk. Overload is retried without limit; any other error
    /// ends this chunk's write and is returned.
    pub async fn publish(
        &self,
        chunk_id: &str,
        document: &ChunkDocument,
    ) -> Result<(), StoreError> {
        let _guard = self.in_flight.register();
        debug!(
            chunk_id,
            ordinal = document.ordinal,
            size = document.content.len(),
            name = %document.file_name,
            "publishing chunk"
        );

        let mut overloaded = false;
        loop {
            match self.store.upsert(chunk_id, document).await {
                Ok(()) => return Ok(()),
                Err(error) if error.is_overloaded() => {
                    if overloaded {
                        let grown = self.backoff.grow();
                        warn!(backoff_ms = millis(grown), "increase sleep duration");
                    }
                    overloaded = true;

                    let wait = self.backoff.current();
                    warn!(
                        chunk_id,
                        backoff_ms = millis(wait),
                        %error,
                        "backend overloaded, waiting"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(error) => {
                    warn!(chunk_id, %error, "error indexing chunk");
                    return Err(error);
                }
            }
        }
    }
}
