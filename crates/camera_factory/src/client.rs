//! Camera client abstraction
//!
//! Separates device enumeration/setup from the capture loop so the mock
//! camera and real SDK bindings share one setup path.

use contracts::{CaptureDriver, ContractError, SourceConfig, TriggerConfig};

use crate::error::Result;

/// Camera system handle (enumerates and opens devices)
pub trait CameraClient: Send + Sync {
    /// Device type handed to producer threads
    type Device: CameraDevice;

    /// Number of attached cameras
    fn camera_count(&self) -> usize;

    /// Open and initialize the camera at `index`
    ///
    /// The device is not yet configured nor acquiring.
    fn open(&self, index: usize, config: &SourceConfig) -> Result<Self::Device>;
}

/// Device lifecycle on top of the capture interface
///
/// Call order: `configure` → `begin_acquisition` → capture loop →
/// `end_acquisition` → `deinit`.
pub trait CameraDevice: CaptureDriver + 'static {
    /// Apply trigger mode, trigger source and timestamp settings
    fn configure(&mut self, trigger: &TriggerConfig) -> std::result::Result<(), ContractError>;

    fn begin_acquisition(&mut self) -> std::result::Result<(), ContractError>;

    fn end_acquisition(&mut self) -> std::result::Result<(), ContractError>;

    /// Release the device; no call is valid afterwards
    fn deinit(&mut self) -> std::result::Result<(), ContractError>;
}
