//! Lifecycle controller
//!
//! Wires cameras, producers and the synchronizer together for one run and
//! guarantees every started thread is joined before devices are released.

use std::sync::Arc;
use std::time::Instant;

use camera_factory::{CameraClient, RigFactory};
use contracts::{
    FormatNormalizer, Placeholder, ProducerConfig, RenderSink, RigBlueprint, SourceConfig,
    SourceId, StopFlag, SyncEngineConfig,
};
use ingestion::{ItemQueue, ProducerHandle, ProducerLoop, SourceQueue};
use sync_engine::SynchronizerLoop;
use tracing::{error, info, instrument, warn};

use crate::error::LifecycleError;
use crate::report::{ProducerSummary, RunReport};

/// Configuration of one run
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Cameras in source-index order
    pub sources: Vec<SourceConfig>,

    /// Per-source producer settings (index-aligned with `sources`)
    pub producers: Vec<ProducerConfig>,

    /// Synchronizer settings
    pub sync: SyncEngineConfig,
}

impl LifecycleConfig {
    pub fn from_blueprint(blueprint: &RigBlueprint) -> Self {
        Self {
            sources: blueprint.sources.clone(),
            producers: (0..blueprint.source_count())
                .map(|index| blueprint.to_producer_config(index))
                .collect(),
            sync: blueprint.to_sync_engine_config(),
        }
    }

    fn producer_config(&self, index: usize) -> ProducerConfig {
        self.producers.get(index).copied().unwrap_or_default()
    }

    fn source_ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|source| source.id.clone()).collect()
    }

    fn check(&self) -> Result<(), LifecycleError> {
        if self.sources.is_empty() {
            return Err(LifecycleError::config("at least one source is required"));
        }
        if self.sync.source_count != self.sources.len() {
            return Err(LifecycleError::config(format!(
                "synchronizer expects {} sources, {} configured",
                self.sync.source_count,
                self.sources.len()
            )));
        }
        Ok(())
    }
}

/// Run controller
///
/// Owns the stop flag of exactly one run.
pub struct Lifecycle {
    config: LifecycleConfig,
    stop: StopFlag,
}

impl Lifecycle {
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            stop: StopFlag::new(),
        }
    }

    /// Handle for external shutdown (Ctrl-C, timeout)
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Execute the run to completion
    ///
    /// Blocks until the synchronizer exits (sink quit, `max_composites` or the
    /// stop flag), then stops and joins every producer and releases the
    /// cameras.
    ///
    /// # Errors
    /// - `Config` / `Setup`: nothing was started
    /// - `Producer` / `Sync`: threads already started were stopped and joined
    ///   and their devices released before returning
    #[instrument(
        name = "lifecycle_run",
        skip_all,
        fields(sources = self.config.sources.len(), policy = ?self.config.sync.policy)
    )]
    pub fn run<C, N, S>(
        self,
        factory: &RigFactory<C>,
        normalizer: N,
        sink: S,
    ) -> Result<RunReport<S>, LifecycleError>
    where
        C: CameraClient,
        N: FormatNormalizer + 'static,
        N::Output: Placeholder,
        S: RenderSink<N::Output> + 'static,
    {
        self.config.check()?;
        let started = Instant::now();
        let count = self.config.sources.len();

        let queues: Vec<ItemQueue<N::Output>> =
            (0..count).map(|_| Arc::new(SourceQueue::new())).collect();

        let synchronizer = SynchronizerLoop::new(
            queues.clone(),
            sink,
            self.stop.clone(),
            self.config.sync.clone(),
        )?
        .with_source_ids(self.config.source_ids());

        let devices = factory.setup(&self.config.sources)?;
        info!(cameras = devices.len(), "cameras ready, starting threads");

        let normalizer = Arc::new(normalizer);
        let mut producers: Vec<ProducerHandle<C::Device>> = Vec::with_capacity(count);

        for (index, device) in devices.into_iter().enumerate() {
            let spawned = ProducerLoop::new(
                index,
                device,
                Arc::clone(&normalizer),
                Arc::clone(&queues[index]),
                self.stop.clone(),
                self.config.producer_config(index),
            )
            .spawn();

            match spawned {
                Ok(handle) => producers.push(handle),
                Err(e) => {
                    error!(index, error = %e, "failed to start producer, stopping run");
                    self.stop.raise();
                    self.shutdown(factory, producers);
                    return Err(e.into());
                }
            }
        }

        let sync_handle = match synchronizer.spawn() {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, "failed to start synchronizer, stopping run");
                self.stop.raise();
                self.shutdown(factory, producers);
                return Err(e.into());
            }
        };

        info!(producers = producers.len(), "pipeline running");

        let sync_result = sync_handle.join();
        if self.stop.raise() {
            info!("synchronizer returned, stop flag raised");
        }

        let (summaries, panicked, teardown_failures) = self.shutdown(factory, producers);
        let duration = started.elapsed();

        let sync = sync_result?;
        info!(
            composites = sync.composites(),
            abandoned = sync.cycles_abandoned(),
            duration_secs = duration.as_secs_f64(),
            "run complete"
        );

        Ok(RunReport {
            sync,
            producers: summaries,
            panicked,
            teardown_failures,
            duration,
        })
    }

    /// Join producers in index order, then release recovered devices
    ///
    /// The stop flag must already be raised.
    fn shutdown<C: CameraClient>(
        &self,
        factory: &RigFactory<C>,
        producers: Vec<ProducerHandle<C::Device>>,
    ) -> (Vec<ProducerSummary>, Vec<SourceId>, usize) {
        let mut summaries = Vec::with_capacity(producers.len());
        let mut devices = Vec::with_capacity(producers.len());
        let mut panicked = Vec::new();

        for handle in producers {
            let source_id = handle.source_id().clone();
            match handle.join() {
                Ok(report) => {
                    summaries.push(ProducerSummary {
                        index: report.index,
                        source_id: report.source_id,
                        iterations: report.iterations,
                        captures: report.captures,
                    });
                    devices.push(report.driver);
                }
                Err(e) => {
                    error!(source = %source_id, error = %e, "producer lost, device cannot be released");
                    panicked.push(source_id);
                }
            }
        }

        let failures = factory.teardown(devices);
        if !failures.is_empty() {
            warn!(failures = failures.len(), "some cameras failed to release");
        }

        (summaries, panicked, failures.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera_factory::{DeviceEvent, ImageNormalizer, MockCameraClient, MockClientConfig};
    use contracts::{Composite, ContractError, DisplayFormat, ImageFrame, PixelFormat};
    use std::thread;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct CountingSink {
        cycles: Vec<u64>,
        closed: bool,
    }

    impl RenderSink<ImageFrame> for CountingSink {
        fn name(&self) -> &str {
            "counting"
        }

        fn render_grid(&mut self, composite: &Composite<ImageFrame>) -> Result<(), ContractError> {
            self.cycles.push(composite.cycle_id);
            Ok(())
        }

        fn poll_quit(&mut self) -> bool {
            false
        }

        fn close(&mut self) -> Result<(), ContractError> {
            self.closed = true;
            Ok(())
        }
    }

    fn blueprint(sources: usize, max_composites: Option<u64>) -> RigBlueprint {
        let mut blueprint = RigBlueprint::with_sources(sources);
        blueprint.rig.display = DisplayFormat {
            width: 8,
            height: 6,
            format: PixelFormat::Rgb8,
        };
        for source in &mut blueprint.sources {
            source.frequency_hz = 200.0;
            source.capture_timeout_ms = 50;
        }
        blueprint.sync.max_composites = max_composites;
        blueprint
    }

    fn mock_factory(config: MockClientConfig) -> RigFactory<MockCameraClient> {
        RigFactory::new(MockCameraClient::with_config(MockClientConfig {
            width: 16,
            height: 12,
            ..config
        }))
    }

    #[test]
    fn test_run_until_max_composites() {
        let factory = mock_factory(MockClientConfig::default());
        let lifecycle = Lifecycle::new(LifecycleConfig::from_blueprint(&blueprint(3, Some(5))));

        let report = lifecycle
            .run(&factory, ImageNormalizer, CountingSink::default())
            .unwrap();

        assert_eq!(report.sync.composites(), 5);
        assert_eq!(report.sync.sink.cycles, vec![1, 2, 3, 4, 5]);
        assert!(report.sync.sink.closed);
        assert_eq!(report.producers.len(), 3);
        assert!(report.is_clean());

        let events = factory.client().events();
        for index in 0..3 {
            assert!(events.contains(&DeviceEvent::Ended(index)));
            assert!(events.contains(&DeviceEvent::Deinit(index)));
        }
    }

    #[test]
    fn test_setup_failure_starts_nothing() {
        let factory = mock_factory(MockClientConfig {
            fail_begin: vec![1],
            ..Default::default()
        });
        let lifecycle = Lifecycle::new(LifecycleConfig::from_blueprint(&blueprint(3, None)));
        let stop = lifecycle.stop_flag();

        let err = lifecycle
            .run(&factory, ImageNormalizer, CountingSink::default())
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Setup(_)));
        assert!(!stop.is_raised());
        assert!(!factory.client().events().contains(&DeviceEvent::Opened(2)));
    }

    #[test]
    fn test_external_stop_joins_everything() {
        let factory = Arc::new(mock_factory(MockClientConfig::default()));
        let lifecycle = Lifecycle::new(LifecycleConfig::from_blueprint(&blueprint(2, None)));
        let stop = lifecycle.stop_flag();

        let runner = {
            let factory = Arc::clone(&factory);
            thread::spawn(move || lifecycle.run(&*factory, ImageNormalizer, CountingSink::default()))
        };

        thread::sleep(Duration::from_millis(100));
        stop.raise();

        let report = runner.join().unwrap().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.producers.len(), 2);
        assert!(factory.client().events().contains(&DeviceEvent::Deinit(1)));
    }

    #[test]
    fn test_source_count_mismatch_rejected() {
        let mut config = LifecycleConfig::from_blueprint(&blueprint(2, None));
        config.sync.source_count = 3;

        let factory = mock_factory(MockClientConfig::default());
        let err = Lifecycle::new(config)
            .run(&factory, ImageNormalizer, CountingSink::default())
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Config { .. }));
        assert!(factory.client().events().is_empty());
    }
}
