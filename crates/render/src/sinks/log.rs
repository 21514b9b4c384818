//! LogSink - logs composite summary via tracing

use contracts::{Composite, ContractError, RenderSink};
use tracing::{info, instrument};

/// Sink that logs one line per composite
pub struct LogSink {
    name: String,
    rendered: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rendered: 0,
        }
    }

    /// Composites logged so far
    pub fn rendered(&self) -> u64 {
        self.rendered
    }
}

impl<P> RenderSink<P> for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_grid(&mut self, composite: &Composite<P>) -> Result<(), ContractError> {
        self.rendered += 1;
        info!(
            sink = %self.name,
            cycle_id = composite.cycle_id,
            rows = composite.layout.rows,
            cols = composite.layout.cols,
            sources = composite.source_count(),
            reference_ts = composite.diagnostics.reference_timestamp,
            max_offset_ns = composite.diagnostics.max_abs_offset_ns(),
            "composite"
        );
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        false
    }

    #[instrument(name = "log_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, rendered = self.rendered, "LogSink closed");
        Ok(())
    }
}
