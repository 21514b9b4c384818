//! Camera Factory error types

use contracts::ContractError;
use thiserror::Error;

/// Camera Factory specific error
#[derive(Debug, Error)]
pub enum CameraFactoryError {
    /// Fewer cameras attached than configured sources
    #[error("requested {requested} cameras but only {available} available")]
    NoCameras { requested: usize, available: usize },

    /// Device open / init failed
    #[error("failed to open camera '{source_id}': {message}")]
    Open { source_id: String, message: String },

    /// Trigger / acquisition mode configuration failed
    #[error("failed to configure camera '{source_id}': {message}")]
    Configure { source_id: String, message: String },

    /// Begin acquisition failed
    #[error("failed to begin acquisition on camera '{source_id}': {message}")]
    BeginAcquisition { source_id: String, message: String },

    /// End acquisition / deinit failed
    #[error("failed to release camera '{source_id}': {message}")]
    Teardown { source_id: String, message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl CameraFactoryError {
    pub fn open(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Open {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    pub fn configure(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configure {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    pub fn begin_acquisition(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BeginAcquisition {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    pub fn teardown(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Teardown {
            source_id: source_id.into(),
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, CameraFactoryError>;
