//! Shared fixtures

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    Composite, ContractError, ImageFrame, PixelFormat, RenderSink, TimedItem,
};
use ingestion::{ItemQueue, SourceQueue};

/// Sink recording `(source_index, timestamp)` of every rendered cell
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub composites: Vec<Vec<(usize, u64)>>,
    pub offsets: Vec<Vec<i64>>,
    pub blanks: Vec<usize>,
    pub closed: bool,
}

impl<P> RenderSink<P> for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn render_grid(&mut self, composite: &Composite<P>) -> Result<(), ContractError> {
        self.composites.push(
            composite
                .items()
                .map(|item| (item.source_index(), item.timestamp()))
                .collect(),
        );
        self.offsets.push(composite.diagnostics.offsets_ns.clone());
        self.blanks.push(composite.blank_count());
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

pub fn queues<P>(count: usize) -> Vec<ItemQueue<P>> {
    (0..count).map(|_| Arc::new(SourceQueue::new())).collect()
}

/// 1x1 mono frame whose single pixel encodes `value`
pub fn tiny_frame(value: u8) -> ImageFrame {
    ImageFrame {
        width: 1,
        height: 1,
        format: PixelFormat::Mono8,
        data: vec![value].into(),
    }
}

pub fn push_frame(queue: &ItemQueue<ImageFrame>, value: u8, timestamp: u64, source: usize) {
    queue.push(TimedItem::new(tiny_frame(value), timestamp, source));
}

/// Poll `condition` every millisecond until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}
