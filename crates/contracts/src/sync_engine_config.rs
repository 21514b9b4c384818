//! Runtime configuration contracts shared by the producer, synchronizer and
//! lifecycle crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::DisplayFormat;

/// Frame-set collection policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Pop one item per source in index order; abandon the cycle on the first
    /// empty queue
    #[default]
    Lockstep,
    /// Buffer a short window per source and pick the items closest to a
    /// common target timestamp
    TimeWindow,
}

/// Time-window matching configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WindowConfig {
    /// Maximum distance from the target timestamp (ns)
    #[serde(default = "default_tolerance_ns")]
    pub tolerance_ns: u64,

    /// Items retained per source while waiting for a match
    #[serde(default = "default_window_depth")]
    #[validate(range(min = 1, message = "window depth must be >= 1"))]
    pub depth: usize,
}

fn default_tolerance_ns() -> u64 {
    1_000_000
}

fn default_window_depth() -> usize {
    8
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            tolerance_ns: default_tolerance_ns(),
            depth: default_window_depth(),
        }
    }
}

/// Synchronizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEngineConfig {
    /// Number of sources (N)
    pub source_count: usize,

    /// Collection policy
    #[serde(default)]
    pub policy: SyncPolicy,

    /// Sleep between abandoned cycles
    pub poll_interval_ms: u64,

    /// Queue depth that triggers a growth warning
    pub depth_warning: usize,

    /// Window matching parameters (TimeWindow policy only)
    #[serde(default)]
    pub window: WindowConfig,

    /// Per-source clock offsets added before comparing timestamps (ns)
    #[serde(default)]
    pub clock_offsets_ns: Vec<i64>,

    /// Raise the stop flag after this many composites (None = unlimited)
    #[serde(default)]
    pub max_composites: Option<u64>,
}

impl SyncEngineConfig {
    /// Lockstep configuration with default tuning
    pub fn lockstep(source_count: usize) -> Self {
        Self {
            source_count,
            policy: SyncPolicy::Lockstep,
            poll_interval_ms: 1,
            depth_warning: 64,
            window: WindowConfig::default(),
            clock_offsets_ns: vec![0; source_count],
            max_composites: None,
        }
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Clock offset for a source (0 when not configured)
    pub fn clock_offset(&self, source_index: usize) -> i64 {
        self.clock_offsets_ns
            .get(source_index)
            .copied()
            .unwrap_or(0)
    }
}

/// Producer loop configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Bound on one blocking capture wait
    pub capture_timeout_ms: u64,

    /// Normalization target
    pub display: DisplayFormat,
}

impl ProducerConfig {
    /// Capture timeout as a `Duration`
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            capture_timeout_ms: 1000,
            display: DisplayFormat::default(),
        }
    }
}
