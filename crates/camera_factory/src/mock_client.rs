//! Mock 相机客户端
//!
//! 用于测试和无硬件运行的 mock 实现，支持注入失败场景。

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use contracts::SourceConfig;
use tracing::instrument;

use crate::client::CameraClient;
use crate::error::{CameraFactoryError, Result};
use crate::mock_camera::{MockCamera, MockCameraConfig};

/// Mock 客户端配置
#[derive(Debug, Clone)]
pub struct MockClientConfig {
    /// 可用相机数量
    pub camera_count: usize,
    /// 传感器宽度
    pub width: u32,
    /// 传感器高度
    pub height: u32,
    /// 每 k 帧交付一次不完整图像 (None = 从不)
    pub incomplete_every: Option<u64>,
    /// open 失败的相机 index
    pub fail_open: Vec<usize>,
    /// configure 失败的相机 index
    pub fail_configure: Vec<usize>,
    /// begin acquisition 失败的相机 index
    pub fail_begin: Vec<usize>,
    /// end acquisition 失败的相机 index
    pub fail_end: Vec<usize>,
}

impl Default for MockClientConfig {
    fn default() -> Self {
        Self {
            camera_count: 16,
            width: 64,
            height: 48,
            incomplete_every: None,
            fail_open: Vec::new(),
            fail_configure: Vec::new(),
            fail_begin: Vec::new(),
            fail_end: Vec::new(),
        }
    }
}

/// 设备生命周期事件 (按相机 index 记录)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    Opened(usize),
    Configured(usize),
    Began(usize),
    Ended(usize),
    Deinit(usize),
}

/// 共享事件日志
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<DeviceEvent>>>);

impl EventLog {
    pub fn push(&self, event: DeviceEvent) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn snapshot(&self) -> Vec<DeviceEvent> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Mock 相机客户端
///
/// 所有相机共享同一个 epoch，时钟偏移由 `SourceConfig::clock_offset_ns` 模拟。
pub struct MockCameraClient {
    config: MockClientConfig,
    epoch: Instant,
    events: EventLog,
}

impl MockCameraClient {
    /// 创建默认 mock 客户端
    pub fn new() -> Self {
        Self::with_config(MockClientConfig::default())
    }

    /// 使用配置创建 mock 客户端
    pub fn with_config(config: MockClientConfig) -> Self {
        Self {
            config,
            epoch: Instant::now(),
            events: EventLog::default(),
        }
    }

    /// 至今记录的全部设备事件
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events.snapshot()
    }
}

impl Default for MockCameraClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraClient for MockCameraClient {
    type Device = MockCamera;

    fn camera_count(&self) -> usize {
        self.config.camera_count
    }

    #[instrument(name = "mock_camera_open", skip(self, config), fields(source = %config.id))]
    fn open(&self, index: usize, config: &SourceConfig) -> Result<MockCamera> {
        if self.config.fail_open.contains(&index) {
            return Err(CameraFactoryError::open(config.id.as_str(), "mock failure"));
        }

        self.events.push(DeviceEvent::Opened(index));

        Ok(MockCamera::new(MockCameraConfig {
            index,
            source_id: config.id.clone(),
            width: self.config.width,
            height: self.config.height,
            frequency_hz: config.frequency_hz,
            clock_offset_ns: config.clock_offset_ns,
            epoch: self.epoch,
            incomplete_every: self.config.incomplete_every,
            fail_configure: self.config.fail_configure.contains(&index),
            fail_begin: self.config.fail_begin.contains(&index),
            fail_end: self.config.fail_end.contains(&index),
            events: self.events.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::CaptureDriver;

    #[test]
    fn test_open_records_event() {
        let client = MockCameraClient::new();
        let camera = client.open(1, &SourceConfig::new("left")).unwrap();

        assert_eq!(camera.source_id(), "left");
        assert_eq!(client.events(), vec![DeviceEvent::Opened(1)]);
    }

    #[test]
    fn test_open_failure_injected() {
        let client = MockCameraClient::with_config(MockClientConfig {
            fail_open: vec![0],
            ..Default::default()
        });

        assert!(client.open(0, &SourceConfig::new("cam0")).is_err());
        assert!(client.events().is_empty());
    }
}
