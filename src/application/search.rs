//! Debounced search.
//!
//! Each call supersedes the one before it. A superseded call either never reaches the
//! backend (cancelled during the quiet window) or has its result discarded.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::cache::lock::mutex_lock;

const SOURCE: &str = "application::search";

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub struct SearchDebouncer {
    window: Duration,
    generation: AtomicU64,
    pending: Mutex<Option<(u64, CancellationToken)>>,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl SearchDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: AtomicU64::new(0),
            pending: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait out the quiet window, then run `search`.
    ///
    /// Returns `None` when a later call (or [`cancel`](Self::cancel)) superseded this one,
    /// whether that happened before or while `search` ran. `search` receives the token so it
    /// may stop early, but it is not aborted.
    pub async fn run<F, Fut, T>(&self, search: F) -> Option<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T>,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();
        let previous =
            mutex_lock(&self.pending, SOURCE, "run").replace((generation, token.clone()));
        if let Some((_, previous)) = previous {
            previous.cancel();
        }
        // Releases the slot even when the caller drops this future mid-wait.
        let _release = Release {
            debouncer: self,
            generation,
        };

        tokio::select! {
            _ = token.cancelled() => {
                trace!(generation, "search superseded before dispatch");
                return None;
            }
            _ = tokio::time::sleep(self.window) => {}
        }

        let output = search(token.clone()).await;

        if token.is_cancelled() {
            trace!(generation, "search result discarded");
            None
        } else {
            Some(output)
        }
    }

    /// Supersede whatever call is pending without starting a new one.
    pub fn cancel(&self) {
        if let Some((_, token)) = mutex_lock(&self.pending, SOURCE, "cancel").take() {
            token.cancel();
        }
    }

    /// `true` when no call is waiting or running.
    pub fn is_idle(&self) -> bool {
        mutex_lock(&self.pending, SOURCE, "is_idle").is_none()
    }

    fn release(&self, generation: u64) {
        let mut pending = mutex_lock(&self.pending, SOURCE, "release");
        if pending.as_ref().is_some_and(|(current, _)| *current == generation) {
            pending.take();
        }
    }
}

struct Release<'a> {
    debouncer: &'a SearchDebouncer,
    generation: u64,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.debouncer.release(self.generation);
    }
}
