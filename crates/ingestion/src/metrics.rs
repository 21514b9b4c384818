//! Per-source capture counters

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::SourceId;

/// Why a capture attempt produced no item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Timeout,
    Incomplete,
    TriggerError,
    CaptureError,
    ConvertError,
}

impl DropReason {
    /// Metric label value
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Timeout => "timeout",
            DropReason::Incomplete => "incomplete",
            DropReason::TriggerError => "trigger_error",
            DropReason::CaptureError => "capture_error",
            DropReason::ConvertError => "convert_error",
        }
    }
}

/// Capture metrics for one source
///
/// Shared between the producer thread and whoever reports on it; all
/// counters are relaxed atomics.
#[derive(Debug)]
pub struct CaptureMetrics {
    source: SourceId,
    enqueued: AtomicU64,
    timeouts: AtomicU64,
    incomplete: AtomicU64,
    trigger_errors: AtomicU64,
    capture_errors: AtomicU64,
    convert_errors: AtomicU64,
}

impl CaptureMetrics {
    pub fn new(source: impl Into<SourceId>) -> Self {
        Self {
            source: source.into(),
            enqueued: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            incomplete: AtomicU64::new(0),
            trigger_errors: AtomicU64::new(0),
            capture_errors: AtomicU64::new(0),
            convert_errors: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Record an item pushed to the queue
    pub fn record_enqueued(&self, queue_depth: usize) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        observability::record_item_enqueued(&self.source);
        observability::record_queue_depth(&self.source, queue_depth);
    }

    /// Record an attempt that produced no item
    pub fn record_dropped(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::Timeout => &self.timeouts,
            DropReason::Incomplete => &self.incomplete,
            DropReason::TriggerError => &self.trigger_errors,
            DropReason::CaptureError => &self.capture_errors,
            DropReason::ConvertError => &self.convert_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        observability::record_capture_dropped(&self.source, reason.as_str());
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            incomplete: self.incomplete.load(Ordering::Relaxed),
            trigger_errors: self.trigger_errors.load(Ordering::Relaxed),
            capture_errors: self.capture_errors.load(Ordering::Relaxed),
            convert_errors: self.convert_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `CaptureMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSnapshot {
    pub enqueued: u64,
    pub timeouts: u64,
    pub incomplete: u64,
    pub trigger_errors: u64,
    pub capture_errors: u64,
    pub convert_errors: u64,
}

impl CaptureSnapshot {
    /// Attempts that produced no item
    pub fn dropped(&self) -> u64 {
        self.timeouts
            + self.incomplete
            + self.trigger_errors
            + self.capture_errors
            + self.convert_errors
    }
}
