//! Render error types

use thiserror::Error;

/// Render-specific errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Composite cannot be tiled into one image
    #[error("cannot compose cycle {cycle_id}: {message}")]
    Compose { cycle_id: u64, message: String },

    /// Image encoding/saving error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Contract error
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a compose error
    pub fn compose(cycle_id: u64, message: impl Into<String>) -> Self {
        Self::Compose {
            cycle_id,
            message: message.into(),
        }
    }

    /// Convert into a `ContractError::Render` attributed to `sink_name`
    pub fn into_contract(self, sink_name: &str) -> contracts::ContractError {
        match self {
            RenderError::Contract(e) => e,
            other => contracts::ContractError::render(sink_name, other.to_string()),
        }
    }
}
