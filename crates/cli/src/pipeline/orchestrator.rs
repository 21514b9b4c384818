//! Run orchestrator - wires the mock camera system, sinks and lifecycle.
//!
//! The lifecycle blocks on OS threads, so it runs inside `spawn_blocking`
//! while the async side waits for Ctrl+C, SIGTERM or the timeout. Every exit
//! path raises the stop flag and then awaits the blocking task, so threads
//! are always joined before returning.

use std::io::{self, BufReader};
use std::time::Duration;

use anyhow::{Context, Result};
use camera_factory::{ImageNormalizer, MockCameraClient, MockClientConfig, RigFactory};
use contracts::{ImageFrame, RigBlueprint};
use lifecycle::{Lifecycle, LifecycleConfig, LifecycleError, RunReport};
use render::{create_sink_set, spawn_quit_listener, QuitSignal, SinkSet};
use tokio::task::JoinError;
use tracing::{info, warn};

/// Run configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated configuration (overrides applied)
    pub blueprint: RigBlueprint,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Listen for `q` on stdin
    pub quit_key: bool,

    /// Mock frame fault injection
    pub incomplete_every: Option<u64>,
}

/// Main run orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run to completion
    pub async fn run(self) -> Result<RunReport<SinkSet<ImageFrame>>> {
        let blueprint = self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let quit = QuitSignal::new();
        if self.config.quit_key {
            spawn_quit_listener(BufReader::new(io::stdin()), quit.clone())
                .context("Failed to start quit key listener")?;
            info!("Type q + Enter to quit");
        }

        let sink = create_sink_set(&blueprint.sinks, quit).context("Failed to create sinks")?;
        if sink.is_empty() {
            warn!("No sinks configured - composites will not be displayed");
        }

        let client = MockCameraClient::with_config(MockClientConfig {
            camera_count: blueprint.source_count(),
            width: blueprint.rig.display.width,
            height: blueprint.rig.display.height,
            incomplete_every: self.config.incomplete_every,
            ..Default::default()
        });
        info!(
            cameras = blueprint.source_count(),
            "Running against the mock camera system"
        );

        let lifecycle = Lifecycle::new(LifecycleConfig::from_blueprint(&blueprint));
        let stop = lifecycle.stop_flag();

        let mut task = tokio::task::spawn_blocking(move || {
            let factory = RigFactory::new(client);
            lifecycle.run(&factory, ImageNormalizer, sink)
        });

        let timeout = self.config.timeout;
        let deadline = async move {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = &mut task => return finish(result),
            _ = shutdown_signal() => {
                warn!("Received shutdown signal, stopping...");
            }
            _ = deadline => {
                warn!(timeout_secs = timeout.map(|t| t.as_secs_f64()), "Run timed out");
            }
        }

        stop.raise();
        finish(task.await)
    }
}

fn finish(
    result: std::result::Result<
        std::result::Result<RunReport<SinkSet<ImageFrame>>, LifecycleError>,
        JoinError,
    >,
) -> Result<RunReport<SinkSet<ImageFrame>>> {
    let report = result
        .context("Lifecycle task panicked")?
        .context("Run failed")?;

    info!(
        composites = report.sync.composites(),
        abandoned = report.sync.cycles_abandoned(),
        duration_secs = report.duration.as_secs_f64(),
        fps = format!("{:.2}", report.fps()),
        "Run completed"
    );
    Ok(report)
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
