//! Coalescing of rapid inputs such as search keystrokes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Generation-stamped debouncer.
///
/// Each call to [`settle`](Self::settle) claims a new generation, waits out the window,
/// and yields its value only if no later call claimed a newer generation meanwhile.
/// Clones share the same generation counter.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    /// Creates a debouncer with the given quiet window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Waits for the window, returning `Some(value)` if this was the latest input.
    pub async fn settle<T>(&self, value: T) -> Option<T> {
        let stamp = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.window).await;
        (self.generation.load(Ordering::SeqCst) == stamp).then_some(value)
    }
}
