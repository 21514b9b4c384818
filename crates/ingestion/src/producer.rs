//! Per-source producer loop
//!
//! trigger → wait → timestamp → normalize → enqueue, until the stop flag is
//! raised. Every failure is local to one iteration.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use contracts::{
    CaptureDriver, CaptureOutcome, FormatNormalizer, ProducerConfig, SourceId, StopFlag, TimedItem,
};
use tracing::{debug, trace, warn};

use crate::error::{IngestionError, Result};
use crate::metrics::{CaptureMetrics, CaptureSnapshot, DropReason};
use crate::queue::SourceQueue;

/// Queue handle carried by a producer
pub type ItemQueue<P> = Arc<SourceQueue<TimedItem<P>>>;

/// Result of one producer iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// An item was pushed to the queue
    Enqueued,
    /// `arm_trigger` failed
    TriggerFailed,
    /// No capture arrived within the timeout
    Timeout,
    /// The driver delivered a partial image
    Incomplete,
    /// `wait_for_capture` returned an error
    CaptureFailed,
    /// The normalizer rejected the raw buffer
    ConvertFailed,
}

/// Producer loop for source index `index`
pub struct ProducerLoop<D, N>
where
    N: FormatNormalizer,
{
    index: usize,
    source_id: SourceId,
    driver: D,
    normalizer: Arc<N>,
    queue: ItemQueue<N::Output>,
    stop: StopFlag,
    config: ProducerConfig,
    metrics: Arc<CaptureMetrics>,
}

impl<D, N> ProducerLoop<D, N>
where
    D: CaptureDriver,
    N: FormatNormalizer,
{
    pub fn new(
        index: usize,
        driver: D,
        normalizer: Arc<N>,
        queue: ItemQueue<N::Output>,
        stop: StopFlag,
        config: ProducerConfig,
    ) -> Self {
        let source_id = SourceId::new(driver.source_id());
        let metrics = Arc::new(CaptureMetrics::new(source_id.clone()));

        Self {
            index,
            source_id,
            driver,
            normalizer,
            queue,
            stop,
            config,
            metrics,
        }
    }

    /// Share externally owned metrics (e.g. to observe a running producer)
    pub fn with_metrics(mut self, metrics: Arc<CaptureMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<CaptureMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    /// Run one capture iteration
    pub fn step(&mut self) -> StepOutcome {
        if let Err(e) = self.driver.arm_trigger() {
            warn!(source = %self.source_id, error = %e, "trigger failed");
            return self.dropped(DropReason::TriggerError, StepOutcome::TriggerFailed);
        }

        let raw = match self.driver.wait_for_capture(self.config.capture_timeout()) {
            Ok(CaptureOutcome::Complete(raw)) => raw,
            Ok(CaptureOutcome::Timeout) => {
                debug!(source = %self.source_id, "capture timed out");
                return self.dropped(DropReason::Timeout, StepOutcome::Timeout);
            }
            Ok(CaptureOutcome::Incomplete) => {
                debug!(source = %self.source_id, "incomplete capture dropped");
                return self.dropped(DropReason::Incomplete, StepOutcome::Incomplete);
            }
            Err(e) => {
                warn!(source = %self.source_id, error = %e, "capture failed");
                return self.dropped(DropReason::CaptureError, StepOutcome::CaptureFailed);
            }
        };

        let timestamp = self.driver.timestamp(&raw);
        let frame_id = raw.frame_id;

        let payload = match self.normalizer.convert(raw, &self.config.display) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(source = %self.source_id, frame_id, error = %e, "conversion failed");
                return self.dropped(DropReason::ConvertError, StepOutcome::ConvertFailed);
            }
        };

        self.queue
            .push(TimedItem::new(payload, timestamp, self.index));
        self.metrics.record_enqueued(self.queue.len());
        trace!(source = %self.source_id, frame_id, timestamp, "item enqueued");

        StepOutcome::Enqueued
    }

    /// Iterate until the stop flag is raised, then hand the driver back
    pub fn run(mut self) -> ProducerReport<D> {
        debug!(source = %self.source_id, index = self.index, "producer started");

        let mut iterations = 0u64;
        while !self.stop.is_raised() {
            self.step();
            iterations += 1;
        }

        let captures = self.metrics.snapshot();
        debug!(
            source = %self.source_id,
            iterations,
            enqueued = captures.enqueued,
            dropped = captures.dropped(),
            "producer stopped"
        );

        ProducerReport {
            index: self.index,
            source_id: self.source_id,
            driver: self.driver,
            iterations,
            captures,
        }
    }

    fn dropped(&self, reason: DropReason, outcome: StepOutcome) -> StepOutcome {
        self.metrics.record_dropped(reason);
        outcome
    }
}

impl<D, N> ProducerLoop<D, N>
where
    D: CaptureDriver + 'static,
    N: FormatNormalizer + 'static,
{
    /// Run on a dedicated OS thread named `producer-<index>`
    pub fn spawn(self) -> Result<ProducerHandle<D>> {
        let index = self.index;
        let source_id = self.source_id.clone();

        let handle = thread::Builder::new()
            .name(format!("producer-{index}"))
            .spawn(move || self.run())
            .map_err(|source| IngestionError::Spawn {
                source_id: source_id.to_string(),
                source,
            })?;

        Ok(ProducerHandle {
            index,
            source_id,
            handle,
        })
    }
}

/// Final state of a producer after its loop exits
#[derive(Debug)]
pub struct ProducerReport<D> {
    pub index: usize,
    pub source_id: SourceId,
    /// Driver handed back for teardown
    pub driver: D,
    /// Loop iterations executed
    pub iterations: u64,
    pub captures: CaptureSnapshot,
}

/// Join handle of a running producer thread
pub struct ProducerHandle<D> {
    index: usize,
    source_id: SourceId,
    handle: JoinHandle<ProducerReport<D>>,
}

impl<D> ProducerHandle<D> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the thread to exit
    ///
    /// # Errors
    /// `IngestionError::Panicked` when the thread panicked; its driver is lost.
    pub fn join(self) -> Result<ProducerReport<D>> {
        self.handle.join().map_err(|_| IngestionError::Panicked {
            source_id: self.source_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FrameTag, ScriptStep, ScriptedDriver, TagNormalizer};
    use std::time::Duration;

    fn producer(
        driver: ScriptedDriver,
        stop: StopFlag,
    ) -> (ProducerLoop<ScriptedDriver, TagNormalizer>, ItemQueue<FrameTag>) {
        let queue = Arc::new(SourceQueue::new());
        let producer = ProducerLoop::new(
            0,
            driver,
            Arc::new(TagNormalizer),
            Arc::clone(&queue),
            stop,
            ProducerConfig::default(),
        );
        (producer, queue)
    }

    #[test]
    fn test_step_enqueues_frame_with_driver_timestamp() {
        let driver = ScriptedDriver::new("cam0", vec![ScriptStep::Frame { timestamp: 123 }]);
        let (mut producer, queue) = producer(driver, StopFlag::new());

        assert_eq!(producer.step(), StepOutcome::Enqueued);

        let item = queue.try_pop().unwrap();
        assert_eq!(item.timestamp(), 123);
        assert_eq!(item.source_index(), 0);
        assert_eq!(item.payload().frame_id, 1);
    }

    #[test]
    fn test_step_drops_each_failure_kind() {
        let driver = ScriptedDriver::new(
            "cam0",
            vec![
                ScriptStep::TriggerError,
                ScriptStep::Timeout,
                ScriptStep::Incomplete,
                ScriptStep::CaptureError,
                ScriptStep::Unconvertible { timestamp: 5 },
                ScriptStep::Frame { timestamp: 6 },
            ],
        );
        let (mut producer, queue) = producer(driver, StopFlag::new());

        let outcomes: Vec<_> = (0..6).map(|_| producer.step()).collect();
        assert_eq!(
            outcomes,
            vec![
                StepOutcome::TriggerFailed,
                StepOutcome::Timeout,
                StepOutcome::Incomplete,
                StepOutcome::CaptureFailed,
                StepOutcome::ConvertFailed,
                StepOutcome::Enqueued,
            ]
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.try_pop().unwrap().timestamp(), 6);

        let snapshot = producer.metrics().snapshot();
        assert_eq!(snapshot.enqueued, 1);
        assert_eq!(snapshot.dropped(), 5);
    }

    #[test]
    fn test_prestopped_producer_never_triggers() {
        let stop = StopFlag::new();
        stop.raise();

        let driver = ScriptedDriver::new("cam0", vec![ScriptStep::Frame { timestamp: 1 }]);
        let triggers = driver.trigger_counter();
        let (producer, queue) = producer(driver, stop);

        let report = producer.run();
        assert_eq!(report.iterations, 0);
        assert_eq!(triggers.get(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_spawned_producer_stops_and_returns_driver() {
        let stop = StopFlag::new();
        let steps = (1..=5).map(|ts| ScriptStep::Frame { timestamp: ts }).collect();
        let driver = ScriptedDriver::new("cam3", steps);
        let (producer, queue) = producer(driver, stop.clone());

        let handle = producer.spawn().unwrap();
        while queue.len() < 5 {
            std::thread::sleep(Duration::from_millis(1));
        }
        stop.raise();

        let report = handle.join().unwrap();
        assert_eq!(report.source_id.as_str(), "cam3");
        assert_eq!(report.driver.source_id(), "cam3");
        assert_eq!(report.captures.enqueued, 5);
        let timestamps: Vec<_> = std::iter::from_fn(|| queue.try_pop())
            .map(|item| item.timestamp())
            .collect();
        assert_eq!(timestamps, vec![1, 2, 3, 4, 5]);
    }
}
