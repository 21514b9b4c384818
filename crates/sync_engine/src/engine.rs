//! Synchronizer loop
//!
//! Owns the consumer end of every source queue and the render sink. Each
//! cycle collects one frame set, composes it into a grid and renders it.

use std::thread::{self, JoinHandle};

use contracts::{
    Composite, Placeholder, RenderSink, SourceId, StopFlag, SyncEngineConfig, SyncPolicy,
};
use ingestion::ItemQueue;
use observability::{RunAggregator, RunSummary};
use tracing::{debug, info, instrument, trace, warn};

use crate::collector::{Collection, Collector};
use crate::error::SyncError;
use crate::grid;

/// Result of one synchronizer cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A composite was rendered
    Rendered { cycle_id: u64 },
    /// A composite was built but the sink failed to draw it
    RenderFailed { cycle_id: u64 },
    /// Source `missing_source` had nothing; `discarded` items were dropped
    Abandoned {
        missing_source: usize,
        discarded: usize,
    },
}

/// Consumer side of the synchronizer
pub struct SynchronizerLoop<P, S> {
    queues: Vec<ItemQueue<P>>,
    sources: Vec<SourceId>,
    sink: S,
    stop: StopFlag,
    config: SyncEngineConfig,
    collector: Collector<P>,
    last_cycle_id: u64,
    aggregator: RunAggregator,
    /// Per-source "depth above warning" latch
    depth_alarm: Vec<bool>,
}

impl<P, S> SynchronizerLoop<P, S>
where
    P: Placeholder,
    S: RenderSink<P>,
{
    /// # Errors
    /// `NoSources` for an empty queue list, `SourceCountMismatch` when the
    /// queue count differs from `config.source_count`.
    pub fn new(
        queues: Vec<ItemQueue<P>>,
        sink: S,
        stop: StopFlag,
        config: SyncEngineConfig,
    ) -> Result<Self, SyncError> {
        if queues.is_empty() {
            return Err(SyncError::NoSources);
        }
        if queues.len() != config.source_count {
            return Err(SyncError::SourceCountMismatch {
                expected: config.source_count,
                actual: queues.len(),
            });
        }

        let sources = (0..queues.len()).map(SourceId::for_index).collect();
        let collector = Collector::from_config(&config);
        let depth_alarm = vec![false; queues.len()];

        Ok(Self {
            queues,
            sources,
            sink,
            stop,
            config,
            collector,
            last_cycle_id: 0,
            aggregator: RunAggregator::new(),
            depth_alarm,
        })
    }

    /// Source names used in logs and metric labels (default `cam<i>`)
    pub fn with_source_ids(mut self, sources: Vec<SourceId>) -> Self {
        if sources.len() == self.queues.len() {
            self.sources = sources;
        }
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Totals so far
    pub fn aggregator(&self) -> &RunAggregator {
        &self.aggregator
    }

    /// Run one collection/compose/render attempt
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.monitor_depths();

        let items = match self.collector.collect(&self.queues) {
            Collection::Complete { items, discarded } => {
                if discarded > 0 {
                    self.aggregator.record_discarded(discarded);
                    observability::record_items_discarded(discarded);
                }
                items
            }
            Collection::Missing {
                source_index,
                discarded,
            } => {
                self.aggregator.record_abandoned(discarded);
                observability::record_cycle_abandoned(discarded);
                trace!(missing_source = source_index, discarded, "cycle abandoned");
                return CycleOutcome::Abandoned {
                    missing_source: source_index,
                    discarded,
                };
            }
        };

        let cycle_id = self.last_cycle_id + 1;
        let Some(composite) = grid::compose(cycle_id, items) else {
            return CycleOutcome::Abandoned {
                missing_source: 0,
                discarded: 0,
            };
        };
        self.last_cycle_id = cycle_id;

        self.aggregator.record_composite(&composite.diagnostics);
        observability::record_composite(&composite.diagnostics, &self.sources);

        let outcome = self.render(&composite);

        if self.sink.poll_quit() {
            info!(sink = self.sink.name(), cycle_id, "quit requested by sink");
            self.stop.raise();
        }

        if let Some(max) = self.config.max_composites {
            if self.aggregator.composites >= max && self.stop.raise() {
                info!(composites = max, "composite limit reached");
            }
        }

        outcome
    }

    /// Loop until the stop flag is raised, then close the sink
    #[instrument(name = "synchronizer_run", skip(self), fields(sources = self.queues.len()))]
    pub fn run(mut self) -> SyncReport<S> {
        let policy = match self.config.policy {
            SyncPolicy::Lockstep => "lockstep",
            SyncPolicy::TimeWindow => "time_window",
        };
        info!(policy, sink = self.sink.name(), "synchronizer started");

        let poll_interval = self.config.poll_interval();
        while !self.stop.is_raised() {
            if let CycleOutcome::Abandoned { .. } = self.run_cycle() {
                thread::sleep(poll_interval);
            }
        }

        if let Err(e) = self.sink.close() {
            warn!(sink = self.sink.name(), error = %e, "sink close failed");
        }

        let summary = self.aggregator.summary();
        info!(
            composites = summary.composites,
            abandoned = summary.cycles_abandoned,
            discarded = summary.items_discarded,
            "synchronizer stopped"
        );

        SyncReport {
            sink: self.sink,
            summary,
        }
    }

    fn render(&mut self, composite: &Composite<P>) -> CycleOutcome {
        let cycle_id = composite.cycle_id;
        match self.sink.render_grid(composite) {
            Ok(()) => {
                observability::record_render(self.sink.name(), true);
                debug!(
                    cycle_id,
                    max_offset_ns = composite.diagnostics.max_abs_offset_ns(),
                    "composite rendered"
                );
                CycleOutcome::Rendered { cycle_id }
            }
            Err(e) => {
                observability::record_render(self.sink.name(), false);
                self.aggregator.record_render_failure();
                warn!(sink = self.sink.name(), cycle_id, error = %e, "render failed");
                CycleOutcome::RenderFailed { cycle_id }
            }
        }
    }

    fn monitor_depths(&mut self) {
        let threshold = self.config.depth_warning;
        for (index, queue) in self.queues.iter().enumerate() {
            let depth = queue.len();
            observability::record_queue_depth(&self.sources[index], depth);

            let above = depth >= threshold;
            if above && !self.depth_alarm[index] {
                warn!(
                    source = %self.sources[index],
                    depth,
                    threshold,
                    "queue depth above warning threshold"
                );
            }
            self.depth_alarm[index] = above;
        }
    }
}

impl<P, S> SynchronizerLoop<P, S>
where
    P: Placeholder + Send + 'static,
    S: RenderSink<P> + 'static,
{
    /// Run on a dedicated OS thread named `synchronizer`
    pub fn spawn(self) -> Result<SynchronizerHandle<S>, SyncError> {
        let handle = thread::Builder::new()
            .name("synchronizer".to_string())
            .spawn(move || self.run())
            .map_err(SyncError::Spawn)?;

        Ok(SynchronizerHandle { handle })
    }
}

/// Final state of the synchronizer
#[derive(Debug)]
pub struct SyncReport<S> {
    /// Sink handed back after `close`
    pub sink: S,
    pub summary: RunSummary,
}

impl<S> SyncReport<S> {
    pub fn composites(&self) -> u64 {
        self.summary.composites
    }

    pub fn cycles_abandoned(&self) -> u64 {
        self.summary.cycles_abandoned
    }

    pub fn items_discarded(&self) -> u64 {
        self.summary.items_discarded
    }

    pub fn render_failures(&self) -> u64 {
        self.summary.render_failures
    }
}

/// Join handle of the synchronizer thread
pub struct SynchronizerHandle<S> {
    handle: JoinHandle<SyncReport<S>>,
}

impl<S> SynchronizerHandle<S> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> Result<SyncReport<S>, SyncError> {
        self.handle.join().map_err(|_| SyncError::Panicked)
    }
}
