//! Frame-set collectors
//!
//! A collector attempts to take exactly one item per source from the
//! queues. It either yields a complete set in source-index order or reports
//! which source had nothing to offer.

use contracts::{SyncEngineConfig, SyncPolicy, TimedItem};
use ingestion::ItemQueue;
use tracing::trace;

use crate::buffer::WindowBuffer;

/// Result of one collection attempt
#[derive(Debug)]
pub enum Collection<P> {
    /// One item per source, index 0..N-1
    Complete {
        items: Vec<TimedItem<P>>,
        /// Items consumed without being used
        discarded: usize,
    },
    /// Source `source_index` could not contribute
    Missing {
        source_index: usize,
        discarded: usize,
    },
}

/// Collector selected by `SyncPolicy`
#[derive(Debug)]
pub enum Collector<P> {
    Lockstep,
    TimeWindow(WindowCollector<P>),
}

impl<P> Collector<P> {
    pub fn from_config(config: &SyncEngineConfig) -> Self {
        match config.policy {
            SyncPolicy::Lockstep => Collector::Lockstep,
            SyncPolicy::TimeWindow => Collector::TimeWindow(WindowCollector::new(config)),
        }
    }

    pub fn collect(&mut self, queues: &[ItemQueue<P>]) -> Collection<P> {
        match self {
            Collector::Lockstep => collect_lockstep(queues),
            Collector::TimeWindow(window) => window.collect(queues),
        }
    }
}

/// Pop queues 0..N-1 in order
///
/// The first empty queue abandons the attempt. Items already popped in this
/// attempt are dropped, never requeued.
pub fn collect_lockstep<P>(queues: &[ItemQueue<P>]) -> Collection<P> {
    let mut items = Vec::with_capacity(queues.len());

    for (source_index, queue) in queues.iter().enumerate() {
        match queue.try_pop() {
            Some(item) => items.push(item),
            None => {
                let discarded = items.len();
                if discarded > 0 {
                    trace!(source_index, discarded, "lockstep attempt abandoned");
                }
                return Collection::Missing {
                    source_index,
                    discarded,
                };
            }
        }
    }

    Collection::Complete {
        items,
        discarded: 0,
    }
}

/// Nearest-timestamp matching over a short per-source window
///
/// Target is the latest aligned head across sources. Items older than
/// `target - tolerance` are skipped; each source then contributes the item
/// closest to the target within tolerance. If any source has none, the
/// attempt waits for more data.
#[derive(Debug)]
pub struct WindowCollector<P> {
    buffers: Vec<WindowBuffer<P>>,
    tolerance_ns: u64,
}

impl<P> WindowCollector<P> {
    pub fn new(config: &SyncEngineConfig) -> Self {
        let buffers = (0..config.source_count)
            .map(|index| WindowBuffer::new(config.window.depth, config.clock_offset(index)))
            .collect();

        Self {
            buffers,
            tolerance_ns: config.window.tolerance_ns,
        }
    }

    /// Items currently buffered for a source
    pub fn buffered(&self, source_index: usize) -> usize {
        self.buffers.get(source_index).map_or(0, WindowBuffer::len)
    }

    pub fn collect(&mut self, queues: &[ItemQueue<P>]) -> Collection<P> {
        let mut discarded = 0;

        for (buffer, queue) in self.buffers.iter_mut().zip(queues) {
            while let Some(item) = queue.try_pop() {
                if buffer.push(item) {
                    discarded += 1;
                }
            }
        }

        if let Some(source_index) = self.buffers.iter().position(WindowBuffer::is_empty) {
            return Collection::Missing {
                source_index,
                discarded,
            };
        }

        let target = self
            .buffers
            .iter()
            .filter_map(WindowBuffer::head_aligned)
            .max()
            .unwrap_or(0);
        let cutoff = target.saturating_sub(self.tolerance_ns);

        let mut positions = Vec::with_capacity(self.buffers.len());
        for (source_index, buffer) in self.buffers.iter_mut().enumerate() {
            discarded += buffer.discard_before(cutoff);
            match buffer.closest(target, self.tolerance_ns) {
                Some(position) => positions.push(position),
                None => {
                    return Collection::Missing {
                        source_index,
                        discarded,
                    }
                }
            }
        }

        let mut items = Vec::with_capacity(self.buffers.len());
        for (buffer, position) in self.buffers.iter_mut().zip(positions) {
            if let Some((item, skipped)) = buffer.take_at(position) {
                discarded += skipped;
                items.push(item);
            }
        }

        Collection::Complete { items, discarded }
    }
}
