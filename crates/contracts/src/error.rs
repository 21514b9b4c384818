//! Layered error definitions
//!
//! Categorized by source: config / device / capture / convert / render

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Device Errors =====
    /// Device setup failed (init, trigger configuration, begin acquisition)
    #[error("device setup error for source '{source_id}': {message}")]
    DeviceSetup { source_id: String, message: String },

    // ===== Capture Errors =====
    /// Driver reported an error while triggering or waiting for a capture
    #[error("capture error for source '{source_id}': {message}")]
    Capture { source_id: String, message: String },

    /// Raw buffer could not be normalized to the display format
    #[error("convert error for source '{source_id}': {message}")]
    Convert { source_id: String, message: String },

    // ===== Render Errors =====
    /// Render sink failed to draw a composite
    #[error("sink '{sink_name}' render error: {message}")]
    Render { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create device setup error
    pub fn device_setup(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeviceSetup {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create capture error
    pub fn capture(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Capture {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create convert error
    pub fn convert(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Convert {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create render error
    pub fn render(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
