//! PreviewSink - keeps the latest composed grid in memory
//!
//! Headless replacement for a preview window. Optionally writes the last
//! grid as an image file on close.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{Composite, ContractError, ImageFrame, RenderSink};
use image::RgbImage;
use tracing::{debug, info, instrument};

use crate::compositor::compose_grid;

#[derive(Debug, Default)]
struct PreviewState {
    latest: Option<RgbImage>,
    frames: u64,
}

/// Read side of a `PreviewSink`
#[derive(Debug, Clone, Default)]
pub struct PreviewHandle(Arc<Mutex<PreviewState>>);

impl PreviewHandle {
    /// Most recent grid, if any
    pub fn latest(&self) -> Option<RgbImage> {
        self.lock().latest.clone()
    }

    /// Grids rendered so far
    pub fn frame_count(&self) -> u64 {
        self.lock().frames
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PreviewState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sink that composes each grid into an `RgbImage`
pub struct PreviewSink {
    name: String,
    handle: PreviewHandle,
    snapshot_path: Option<PathBuf>,
}

impl PreviewSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: PreviewHandle::default(),
            snapshot_path: None,
        }
    }

    /// Create from config params
    ///
    /// Supported params:
    /// - `snapshot_path`: file the last grid is saved to on close (format from extension)
    pub fn from_params(name: impl Into<String>, params: &HashMap<String, String>) -> Self {
        let mut sink = Self::new(name);
        sink.snapshot_path = params.get("snapshot_path").map(PathBuf::from);
        sink
    }

    pub fn handle(&self) -> PreviewHandle {
        self.handle.clone()
    }
}

impl RenderSink<ImageFrame> for PreviewSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_grid(&mut self, composite: &Composite<ImageFrame>) -> Result<(), ContractError> {
        let image = compose_grid(composite).map_err(|e| e.into_contract(&self.name))?;

        let mut state = self.handle.lock();
        state.latest = Some(image);
        state.frames += 1;
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        false
    }

    #[instrument(name = "preview_sink_close", skip(self), fields(sink = %self.name))]
    fn close(&mut self) -> Result<(), ContractError> {
        let Some(path) = self.snapshot_path.as_ref() else {
            debug!("no snapshot path configured");
            return Ok(());
        };

        let state = self.handle.lock();
        if let Some(image) = state.latest.as_ref() {
            image
                .save(path)
                .map_err(|e| ContractError::render(&self.name, e.to_string()))?;
            info!(path = %path.display(), frames = state.frames, "preview snapshot saved");
        }
        Ok(())
    }
}
