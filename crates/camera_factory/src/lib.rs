//! # Camera Factory
//!
//! 相机设备工厂模块。
//!
//! Responsibilities:
//! - Open, configure and start acquisition on every configured camera
//! - Roll back partially prepared rigs in reverse order
//! - Provide teardown (end acquisition → deinit)
//! - Provide a mock camera system and the image format normalizer

pub mod client;
pub mod error;
pub mod factory;
pub mod mock_camera;
pub mod mock_client;
pub mod normalizer;

pub use client::{CameraClient, CameraDevice};
pub use contracts::{CaptureDriver, SourceConfig};
pub use error::{CameraFactoryError, Result};
pub use factory::RigFactory;
pub use mock_camera::{MockCamera, MockCameraConfig};
pub use mock_client::{DeviceEvent, EventLog, MockCameraClient, MockClientConfig};
pub use normalizer::ImageNormalizer;
