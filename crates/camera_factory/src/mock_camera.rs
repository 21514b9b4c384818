//! Mock camera implementation
//!
//! Implements `CameraDevice`, pacing synthetic BGR frames at the configured
//! frequency. Used for tests and for running the pipeline without hardware.

use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{
    CaptureDriver, CaptureOutcome, ContractError, PixelFormat, RawCapture, SourceId,
    TriggerConfig, TriggerMode,
};
use tracing::{debug, trace};

use crate::client::CameraDevice;
use crate::mock_client::{DeviceEvent, EventLog};

/// Mock camera configuration
#[derive(Debug, Clone)]
pub struct MockCameraConfig {
    pub index: usize,
    pub source_id: SourceId,
    pub width: u32,
    pub height: u32,
    /// Frame rate (Hz); non-positive values fall back to 30
    pub frequency_hz: f64,
    /// Correction that maps this camera's clock onto the shared epoch; the
    /// camera reports `epoch_ns - clock_offset_ns`
    pub clock_offset_ns: i64,
    /// Shared epoch (all cameras of one client read the same clock)
    pub epoch: Instant,
    pub incomplete_every: Option<u64>,
    pub fail_configure: bool,
    pub fail_begin: bool,
    pub fail_end: bool,
    pub events: EventLog,
}

/// Mock camera
#[derive(Debug)]
pub struct MockCamera {
    config: MockCameraConfig,
    period: Duration,
    trigger: TriggerConfig,
    next_due: Option<Instant>,
    frame_id: u64,
    armed: bool,
    acquiring: bool,
    released: bool,
}

impl MockCamera {
    pub fn new(config: MockCameraConfig) -> Self {
        let frequency_hz = if config.frequency_hz.is_finite() && config.frequency_hz > 0.0 {
            config.frequency_hz
        } else {
            30.0
        };

        Self {
            period: Duration::from_secs_f64(1.0 / frequency_hz),
            config,
            trigger: TriggerConfig::default(),
            next_due: None,
            frame_id: 0,
            armed: false,
            acquiring: false,
            released: false,
        }
    }

    pub fn index(&self) -> usize {
        self.config.index
    }

    pub fn is_acquiring(&self) -> bool {
        self.acquiring
    }

    /// Frames delivered so far (complete and incomplete)
    pub fn frames_delivered(&self) -> u64 {
        self.frame_id
    }

    fn device_error(&self, message: &str) -> ContractError {
        ContractError::device_setup(self.config.source_id.as_str(), message)
    }

    fn now_ns(&self) -> u64 {
        if !self.trigger.timestamp_enabled {
            return 0;
        }
        let elapsed = self.config.epoch.elapsed().as_nanos() as u64;
        elapsed.saturating_add_signed(self.config.clock_offset_ns.saturating_neg())
    }

    /// Horizontal BGR gradient shifted by the frame number
    fn synthesize(&self) -> Bytes {
        let width = self.config.width as usize;
        let height = self.config.height as usize;
        let shift = self.frame_id as usize;
        let tint = (self.config.index * 40) as u8;

        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.push(((x + shift) % 256) as u8);
                data.push(((y + shift) % 256) as u8);
                data.push(tint);
            }
        }
        Bytes::from(data)
    }
}

impl CaptureDriver for MockCamera {
    fn source_id(&self) -> &str {
        self.config.source_id.as_str()
    }

    fn arm_trigger(&mut self) -> Result<(), ContractError> {
        if !self.acquiring {
            return Err(ContractError::capture(
                self.config.source_id.as_str(),
                "trigger fired while not acquiring",
            ));
        }
        if self.trigger.mode == TriggerMode::Software {
            self.armed = true;
        }
        Ok(())
    }

    fn wait_for_capture(&mut self, timeout: Duration) -> Result<CaptureOutcome, ContractError> {
        if !self.acquiring {
            return Err(ContractError::capture(
                self.config.source_id.as_str(),
                "wait while not acquiring",
            ));
        }

        if self.trigger.mode == TriggerMode::Software && !self.armed {
            thread::sleep(timeout);
            return Ok(CaptureOutcome::Timeout);
        }

        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now + timeout {
            thread::sleep(timeout);
            return Ok(CaptureOutcome::Timeout);
        }
        if due > now {
            thread::sleep(due - now);
        }
        self.next_due = Some((due + self.period).max(Instant::now()));
        self.armed = false;
        self.frame_id += 1;

        if let Some(every) = self.config.incomplete_every {
            if every > 0 && self.frame_id % every == 0 {
                debug!(source = %self.config.source_id, frame_id = self.frame_id, "incomplete frame");
                return Ok(CaptureOutcome::Incomplete);
            }
        }

        let timestamp_ns = self.now_ns();
        trace!(source = %self.config.source_id, frame_id = self.frame_id, timestamp_ns, "frame");

        Ok(CaptureOutcome::Complete(RawCapture {
            width: self.config.width,
            height: self.config.height,
            format: PixelFormat::Bgr8,
            data: self.synthesize(),
            timestamp_ns,
            frame_id: self.frame_id,
        }))
    }
}

impl CameraDevice for MockCamera {
    fn configure(&mut self, trigger: &TriggerConfig) -> Result<(), ContractError> {
        if self.config.fail_configure {
            return Err(self.device_error("mock configure failure"));
        }
        self.trigger = *trigger;
        self.config
            .events
            .push(DeviceEvent::Configured(self.config.index));
        Ok(())
    }

    fn begin_acquisition(&mut self) -> Result<(), ContractError> {
        if self.config.fail_begin {
            return Err(self.device_error("mock begin acquisition failure"));
        }
        self.acquiring = true;
        self.next_due = None;
        self.config.events.push(DeviceEvent::Began(self.config.index));
        Ok(())
    }

    fn end_acquisition(&mut self) -> Result<(), ContractError> {
        self.acquiring = false;
        self.armed = false;
        self.config.events.push(DeviceEvent::Ended(self.config.index));
        if self.config.fail_end {
            return Err(self.device_error("mock end acquisition failure"));
        }
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), ContractError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.config.events.push(DeviceEvent::Deinit(self.config.index));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(frequency_hz: f64, incomplete_every: Option<u64>) -> MockCamera {
        MockCamera::new(MockCameraConfig {
            index: 0,
            source_id: SourceId::from("cam0"),
            width: 8,
            height: 4,
            frequency_hz,
            clock_offset_ns: 0,
            epoch: Instant::now(),
            incomplete_every,
            fail_configure: false,
            fail_begin: false,
            fail_end: false,
            events: EventLog::default(),
        })
    }

    fn acquiring(mut camera: MockCamera, trigger: TriggerConfig) -> MockCamera {
        camera.configure(&trigger).unwrap();
        camera.begin_acquisition().unwrap();
        camera
    }

    #[test]
    fn test_trigger_requires_acquisition() {
        let mut camera = camera(100.0, None);
        assert!(camera.arm_trigger().is_err());
    }

    #[test]
    fn test_software_trigger_delivers_frame() {
        let mut camera = acquiring(camera(200.0, None), TriggerConfig::default());
        camera.arm_trigger().unwrap();

        match camera.wait_for_capture(Duration::from_millis(100)).unwrap() {
            CaptureOutcome::Complete(raw) => {
                assert_eq!(raw.format, PixelFormat::Bgr8);
                assert_eq!(raw.data.len(), 8 * 4 * 3);
                assert_eq!(raw.frame_id, 1);
            }
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn test_unarmed_software_trigger_times_out() {
        let mut camera = acquiring(camera(200.0, None), TriggerConfig::default());
        let outcome = camera.wait_for_capture(Duration::from_millis(5)).unwrap();
        assert!(matches!(outcome, CaptureOutcome::Timeout));
    }

    #[test]
    fn test_slow_camera_times_out() {
        let trigger = TriggerConfig {
            mode: TriggerMode::FreeRun,
            ..Default::default()
        };
        let mut camera = acquiring(camera(2.0, None), trigger);

        // 首帧立即交付，下一帧在 500ms 后
        assert!(matches!(
            camera.wait_for_capture(Duration::from_millis(10)).unwrap(),
            CaptureOutcome::Complete(_)
        ));
        assert!(matches!(
            camera.wait_for_capture(Duration::from_millis(10)).unwrap(),
            CaptureOutcome::Timeout
        ));
    }

    #[test]
    fn test_incomplete_every_k_frames() {
        let trigger = TriggerConfig {
            mode: TriggerMode::FreeRun,
            ..Default::default()
        };
        let mut camera = acquiring(camera(1000.0, Some(2)), trigger);

        let outcomes: Vec<_> = (0..4)
            .map(|_| camera.wait_for_capture(Duration::from_millis(100)).unwrap())
            .collect();
        assert!(matches!(outcomes[0], CaptureOutcome::Complete(_)));
        assert!(matches!(outcomes[1], CaptureOutcome::Incomplete));
        assert!(matches!(outcomes[2], CaptureOutcome::Complete(_)));
        assert!(matches!(outcomes[3], CaptureOutcome::Incomplete));
    }

    #[test]
    fn test_timestamps_disabled() {
        let trigger = TriggerConfig {
            mode: TriggerMode::FreeRun,
            timestamp_enabled: false,
            ..Default::default()
        };
        let mut camera = acquiring(camera(1000.0, None), trigger);

        match camera.wait_for_capture(Duration::from_millis(100)).unwrap() {
            CaptureOutcome::Complete(raw) => assert_eq!(camera.timestamp(&raw), 0),
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn test_timestamps_increase() {
        let trigger = TriggerConfig {
            mode: TriggerMode::FreeRun,
            ..Default::default()
        };
        let mut camera = acquiring(camera(1000.0, None), trigger);

        let mut last = 0;
        for _ in 0..3 {
            if let CaptureOutcome::Complete(raw) =
                camera.wait_for_capture(Duration::from_millis(100)).unwrap()
            {
                assert!(raw.timestamp_ns >= last);
                last = raw.timestamp_ns;
            }
        }
        assert!(last > 0);
    }
}
