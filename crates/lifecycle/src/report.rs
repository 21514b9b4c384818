//! Run statistics

use std::fmt;
use std::time::Duration;

use contracts::SourceId;
use ingestion::CaptureSnapshot;
use sync_engine::SyncReport;

/// Final counters of one producer
#[derive(Debug, Clone)]
pub struct ProducerSummary {
    pub index: usize,
    pub source_id: SourceId,
    pub iterations: u64,
    pub captures: CaptureSnapshot,
}

/// Statistics from a completed run
#[derive(Debug)]
pub struct RunReport<S> {
    /// Synchronizer totals and the closed sink
    pub sync: SyncReport<S>,

    /// Producers that exited normally, in index order
    pub producers: Vec<ProducerSummary>,

    /// Producers whose thread panicked (device could not be released)
    pub panicked: Vec<SourceId>,

    /// Devices whose teardown reported an error
    pub teardown_failures: usize,

    /// Wall time from setup to teardown
    pub duration: Duration,
}

impl<S> RunReport<S> {
    /// Composites per second
    pub fn fps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.sync.composites() as f64 / secs
        } else {
            0.0
        }
    }

    /// Whether every thread exited and every device was released
    pub fn is_clean(&self) -> bool {
        self.panicked.is_empty() && self.teardown_failures == 0
    }
}

impl<S> fmt::Display for RunReport<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Duration: {:.2}s", self.duration.as_secs_f64())?;
        writeln!(f, "FPS: {:.2}", self.fps())?;
        write!(f, "{}", self.sync.summary)?;

        writeln!(f, "=== Producers ===")?;
        for producer in &self.producers {
            writeln!(
                f,
                "{}: iterations={} enqueued={} dropped={} (timeout={} incomplete={})",
                producer.source_id,
                producer.iterations,
                producer.captures.enqueued,
                producer.captures.dropped(),
                producer.captures.timeouts,
                producer.captures.incomplete,
            )?;
        }
        for source in &self.panicked {
            writeln!(f, "{source}: panicked")?;
        }
        if self.teardown_failures > 0 {
            writeln!(f, "Teardown failures: {}", self.teardown_failures)?;
        }
        Ok(())
    }
}
