//! SinkSet - fan-out of one composite to several sinks

use std::sync::Arc;

use contracts::{Composite, ContractError, ImageFrame, RenderSink, SinkConfig, SinkType};
use tracing::{debug, error, info, instrument, warn};

use crate::error::RenderError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::quit::QuitSignal;
use crate::sinks::{LogSink, PreviewSink};

struct SinkEntry<P> {
    sink: Box<dyn RenderSink<P>>,
    metrics: Arc<SinkMetrics>,
}

/// Render sink that forwards every composite to all attached sinks
///
/// A failing sink is logged and counted; the others still render.
pub struct SinkSet<P> {
    name: String,
    entries: Vec<SinkEntry<P>>,
    quit: QuitSignal,
}

impl<P> SinkSet<P> {
    pub fn new(quit: QuitSignal) -> Self {
        Self {
            name: "sinks".to_string(),
            entries: Vec::new(),
            quit,
        }
    }

    /// Attach a sink; returns its metrics handle
    pub fn push<S: RenderSink<P> + 'static>(&mut self, sink: S) -> Arc<SinkMetrics> {
        let metrics = Arc::new(SinkMetrics::new());
        self.entries.push(SinkEntry {
            sink: Box::new(sink),
            metrics: Arc::clone(&metrics),
        });
        metrics
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn quit_signal(&self) -> &QuitSignal {
        &self.quit
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.entries
            .iter()
            .map(|entry| (entry.sink.name().to_string(), entry.metrics.snapshot()))
            .collect()
    }
}

impl<P> RenderSink<P> for SinkSet<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_grid(&mut self, composite: &Composite<P>) -> Result<(), ContractError> {
        let mut first_error = None;

        for entry in &mut self.entries {
            match entry.sink.render_grid(composite) {
                Ok(()) => {
                    entry.metrics.inc_write_count();
                    observability::record_render(entry.sink.name(), true);
                }
                Err(e) => {
                    entry.metrics.inc_failure_count();
                    observability::record_render(entry.sink.name(), false);
                    warn!(
                        sink = entry.sink.name(),
                        cycle_id = composite.cycle_id,
                        error = %e,
                        "sink render failed"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn poll_quit(&mut self) -> bool {
        // 每个 sink 都需要被轮询
        let mut quit = self.quit.is_raised();
        for entry in &mut self.entries {
            quit |= entry.sink.poll_quit();
        }
        quit
    }

    #[instrument(name = "sink_set_close", skip(self), fields(sinks = self.entries.len()))]
    fn close(&mut self) -> Result<(), ContractError> {
        let mut first_error = None;
        for entry in &mut self.entries {
            if let Err(e) = entry.sink.close() {
                error!(sink = entry.sink.name(), error = %e, "close failed");
                first_error.get_or_insert(e);
            }
        }
        debug!("all sinks closed");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Build a sink set from configuration
#[instrument(
    name = "render_create_sink_set",
    skip(configs, quit),
    fields(sink_count = configs.len())
)]
pub fn create_sink_set(
    configs: &[SinkConfig],
    quit: QuitSignal,
) -> Result<SinkSet<ImageFrame>, RenderError> {
    let mut set = SinkSet::new(quit);

    for config in configs {
        if config.name.is_empty() {
            return Err(RenderError::sink_creation("", "sink name cannot be empty"));
        }
        match config.sink_type {
            SinkType::Log => {
                set.push(LogSink::new(&config.name));
            }
            SinkType::Preview => {
                set.push(PreviewSink::from_params(&config.name, &config.params));
            }
        }
        info!(sink = %config.name, sink_type = ?config.sink_type, "sink created");
    }

    Ok(set)
}
