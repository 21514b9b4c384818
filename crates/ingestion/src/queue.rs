//! Per-source hand-off queue
//!
//! Unbounded FIFO between one producer thread and the synchronizer.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Thread-safe FIFO queue
///
/// `push` never blocks beyond the critical section and never drops an item;
/// there is no depth bound. Depth growth under a slow consumer is visible
/// through `len()` and the queue depth gauge.
#[derive(Debug)]
pub struct SourceQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> SourceQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Append at the tail and wake one blocked consumer
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
        self.available.notify_one();
    }

    /// Remove the head, or `None` immediately when empty
    pub fn try_pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Remove the head, blocking up to `timeout` for one to arrive
    ///
    /// The synchronizer polls with `try_pop`; this is for consumers that
    /// prefer to block.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.lock();

        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            let (guard, _) = self
                .available
                .wait_timeout(items, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            items = guard;
        }
    }

    /// Snapshot; may be stale as soon as it returns
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot; may be stale as soon as it returns
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    // A panicking holder cannot leave the VecDeque half-updated, so the
    // poisoned data is still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for SourceQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
