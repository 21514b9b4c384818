//! Scripted capture driver
//!
//! Replays a fixed sequence of capture results, for tests without a camera.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use contracts::{
    CaptureDriver, CaptureOutcome, ContractError, DisplayFormat, FormatNormalizer, PixelFormat,
    Placeholder, RawCapture,
};

/// One scripted `arm_trigger` + `wait_for_capture` result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStep {
    /// Complete capture with this timestamp (ns)
    Frame { timestamp: u64 },
    /// Complete capture whose buffer `TagNormalizer` rejects
    Unconvertible { timestamp: u64 },
    Timeout,
    Incomplete,
    TriggerError,
    CaptureError,
}

/// Shared trigger counter
#[derive(Debug, Clone, Default)]
pub struct TriggerCounter(Arc<AtomicU64>);

impl TriggerCounter {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

/// Driver replaying a `ScriptStep` sequence
///
/// Once the script is exhausted every wait sleeps `idle` and reports
/// `Timeout`, like a camera that stopped delivering.
#[derive(Debug)]
pub struct ScriptedDriver {
    source_id: String,
    steps: VecDeque<ScriptStep>,
    pending: Option<ScriptStep>,
    idle: Duration,
    frame_id: u64,
    triggers: TriggerCounter,
}

impl ScriptedDriver {
    pub fn new(source_id: &str, steps: Vec<ScriptStep>) -> Self {
        Self {
            source_id: source_id.to_string(),
            steps: steps.into(),
            pending: None,
            idle: Duration::from_millis(1),
            frame_id: 0,
            triggers: TriggerCounter::default(),
        }
    }

    /// Frames with consecutive timestamps `start, start + period, ...`
    pub fn periodic(source_id: &str, start: u64, period: u64, count: usize) -> Self {
        let steps = (0..count as u64)
            .map(|i| ScriptStep::Frame {
                timestamp: start + i * period,
            })
            .collect();
        Self::new(source_id, steps)
    }

    /// Sleep used once the script is exhausted
    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    /// Handle counting `arm_trigger` calls
    pub fn trigger_counter(&self) -> TriggerCounter {
        self.triggers.clone()
    }

    /// Steps not yet replayed
    pub fn remaining(&self) -> usize {
        self.steps.len() + usize::from(self.pending.is_some())
    }

    fn raw(&mut self, timestamp: u64, data: Bytes) -> RawCapture {
        self.frame_id += 1;
        RawCapture {
            width: 1,
            height: 1,
            format: PixelFormat::Mono8,
            data,
            timestamp_ns: timestamp,
            frame_id: self.frame_id,
        }
    }
}

impl CaptureDriver for ScriptedDriver {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn arm_trigger(&mut self) -> Result<(), ContractError> {
        self.triggers.increment();
        match self.steps.pop_front() {
            Some(ScriptStep::TriggerError) => {
                Err(ContractError::capture(&self.source_id, "scripted trigger error"))
            }
            step => {
                self.pending = step;
                Ok(())
            }
        }
    }

    fn wait_for_capture(&mut self, _timeout: Duration) -> Result<CaptureOutcome, ContractError> {
        match self.pending.take() {
            Some(ScriptStep::Frame { timestamp }) => Ok(CaptureOutcome::Complete(
                self.raw(timestamp, Bytes::from_static(&[0xff])),
            )),
            Some(ScriptStep::Unconvertible { timestamp }) => {
                Ok(CaptureOutcome::Complete(self.raw(timestamp, Bytes::new())))
            }
            Some(ScriptStep::Incomplete) => Ok(CaptureOutcome::Incomplete),
            Some(ScriptStep::CaptureError) => Err(ContractError::capture(
                &self.source_id,
                "scripted capture error",
            )),
            Some(ScriptStep::Timeout) => Ok(CaptureOutcome::Timeout),
            Some(ScriptStep::TriggerError) | None => {
                thread::sleep(self.idle);
                Ok(CaptureOutcome::Timeout)
            }
        }
    }
}

/// Minimal payload identifying which capture produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTag {
    pub frame_id: u64,
    pub blank: bool,
}

impl Placeholder for FrameTag {
    fn blank_like(&self) -> Self {
        FrameTag {
            frame_id: 0,
            blank: true,
        }
    }
}

/// Normalizer producing `FrameTag`s; rejects empty buffers
#[derive(Debug, Clone, Copy, Default)]
pub struct TagNormalizer;

impl FormatNormalizer for TagNormalizer {
    type Output = FrameTag;

    fn convert(&self, raw: RawCapture, _target: &DisplayFormat) -> Result<FrameTag, ContractError> {
        if raw.data.is_empty() {
            return Err(ContractError::convert(
                format!("frame-{}", raw.frame_id),
                "empty buffer",
            ));
        }

        Ok(FrameTag {
            frame_id: raw.frame_id,
            blank: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_replays_in_order() {
        let mut driver = ScriptedDriver::new(
            "cam0",
            vec![ScriptStep::Frame { timestamp: 10 }, ScriptStep::Incomplete],
        );

        driver.arm_trigger().unwrap();
        match driver.wait_for_capture(Duration::ZERO).unwrap() {
            CaptureOutcome::Complete(raw) => {
                assert_eq!(raw.timestamp_ns, 10);
                assert_eq!(raw.frame_id, 1);
            }
            other => panic!("expected frame, got {other:?}"),
        }

        driver.arm_trigger().unwrap();
        assert!(matches!(
            driver.wait_for_capture(Duration::ZERO).unwrap(),
            CaptureOutcome::Incomplete
        ));

        driver.arm_trigger().unwrap();
        assert!(matches!(
            driver.wait_for_capture(Duration::ZERO).unwrap(),
            CaptureOutcome::Timeout
        ));
        assert_eq!(driver.trigger_counter().get(), 3);
        assert_eq!(driver.remaining(), 0);
    }

    #[test]
    fn test_periodic_timestamps() {
        let mut driver = ScriptedDriver::periodic("cam1", 100, 100, 3);
        let mut timestamps = Vec::new();
        for _ in 0..3 {
            driver.arm_trigger().unwrap();
            if let CaptureOutcome::Complete(raw) = driver.wait_for_capture(Duration::ZERO).unwrap()
            {
                timestamps.push(driver.timestamp(&raw));
            }
        }
        assert_eq!(timestamps, vec![100, 200, 300]);
    }

    #[test]
    fn test_tag_normalizer_rejects_empty() {
        let mut driver =
            ScriptedDriver::new("cam0", vec![ScriptStep::Unconvertible { timestamp: 1 }]);
        driver.arm_trigger().unwrap();
        let CaptureOutcome::Complete(raw) = driver.wait_for_capture(Duration::ZERO).unwrap() else {
            panic!("expected complete capture");
        };
        assert!(TagNormalizer.convert(raw, &DisplayFormat::default()).is_err());
    }
}
