//! StopFlag - cooperative shutdown signal
//!
//! One flag per run, created by the lifecycle controller before any loop starts
//! and handed to every loop explicitly at construction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, set-once stop flag.
///
/// Cloning yields another handle to the same flag. Once raised it never
/// resets; every loop polls it once per iteration.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// Create a new, lowered flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag
    ///
    /// Returns `true` only for the call that actually flipped it.
    pub fn raise(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Check whether the flag has been raised
    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_flips_once() {
        let flag = StopFlag::new();
        let other = flag.clone();

        assert!(!flag.is_raised());
        assert!(other.raise());
        assert!(!flag.raise());
        assert!(flag.is_raised());
    }

    #[test]
    fn test_visible_across_threads() {
        let flag = StopFlag::new();
        let remote = flag.clone();

        std::thread::spawn(move || {
            remote.raise();
        })
        .join()
        .unwrap();

        assert!(flag.is_raised());
    }
}
