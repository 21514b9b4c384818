//! # Ingestion
//!
//! Per-source capture side of the synchronizer.
//!
//! Responsibilities:
//! - `SourceQueue`: unbounded FIFO hand-off from one producer to the synchronizer
//! - `ProducerLoop`: trigger → wait → timestamp → normalize → enqueue on a
//!   dedicated OS thread until the shared stop flag is raised
//! - Per-source capture metrics
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{ProducerLoop, SourceQueue};
//!
//! let queue = Arc::new(SourceQueue::new());
//! let handle = ProducerLoop::new(0, driver, normalizer, queue.clone(), stop.clone(), config)
//!     .spawn()?;
//!
//! // ... synchronizer pops from `queue` ...
//!
//! stop.raise();
//! let report = handle.join()?;
//! teardown(report.driver);
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::{ScriptStep, ScriptedDriver, TagNormalizer};
//!
//! let driver = ScriptedDriver::new("cam0", vec![
//!     ScriptStep::Frame { timestamp: 100 },
//!     ScriptStep::Incomplete,
//! ]);
//! ```

mod error;
mod metrics;
mod mock;
mod producer;
mod queue;

pub use error::{IngestionError, Result};
pub use metrics::{CaptureMetrics, CaptureSnapshot, DropReason};
pub use mock::{FrameTag, ScriptStep, ScriptedDriver, TagNormalizer, TriggerCounter};
pub use producer::{ItemQueue, ProducerHandle, ProducerLoop, ProducerReport, StepOutcome};
pub use queue::SourceQueue;
