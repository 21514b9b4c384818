//! Per-source window buffer for time-window matching.
//!
//! Uses index-based separation:
//! - HeapRb stores lightweight metadata (aligned timestamp + slab key)
//! - Slab stores the actual `TimedItem`
//!
//! Evicting or skipping items never moves the payloads.

use std::fmt;

use contracts::TimedItem;
use ringbuf::{traits::*, HeapRb};
use slab::Slab;

#[derive(Debug, Clone, Copy)]
struct ItemMeta {
    /// Timestamp shifted by the source clock offset
    aligned: u64,
    slab_key: usize,
}

/// Bounded FIFO of one source's pending items
pub struct WindowBuffer<P> {
    index: HeapRb<ItemMeta>,
    storage: Slab<TimedItem<P>>,
    offset_ns: i64,
    evicted: u64,
}

impl<P> fmt::Debug for WindowBuffer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowBuffer")
            .field("len", &self.index.occupied_len())
            .field("offset_ns", &self.offset_ns)
            .field("evicted", &self.evicted)
            .finish()
    }
}

impl<P> WindowBuffer<P> {
    /// `depth` must be at least 1
    pub fn new(depth: usize, offset_ns: i64) -> Self {
        let depth = depth.max(1);
        Self {
            index: HeapRb::new(depth),
            storage: Slab::with_capacity(depth),
            offset_ns,
            evicted: 0,
        }
    }

    /// Buffer an item; when full the oldest item is evicted
    ///
    /// Returns `true` if an item was evicted.
    pub fn push(&mut self, item: TimedItem<P>) -> bool {
        let mut evicted = false;
        if self.index.is_full() {
            if let Some(oldest) = self.index.try_pop() {
                self.storage.remove(oldest.slab_key);
            }
            self.evicted += 1;
            evicted = true;
        }

        let aligned = self.align(item.timestamp());
        let slab_key = self.storage.insert(item);
        let _ = self.index.try_push(ItemMeta { aligned, slab_key });
        evicted
    }

    /// Aligned timestamp of the oldest buffered item
    pub fn head_aligned(&self) -> Option<u64> {
        self.index.iter().next().map(|meta| meta.aligned)
    }

    /// Drop leading items whose aligned timestamp is below `cutoff`
    pub fn discard_before(&mut self, cutoff: u64) -> usize {
        let mut discarded = 0;
        while let Some(meta) = self.index.iter().next().copied() {
            if meta.aligned >= cutoff {
                break;
            }
            let _ = self.index.try_pop();
            self.storage.remove(meta.slab_key);
            discarded += 1;
        }
        discarded
    }

    /// Position of the item closest to `target` within `tolerance`
    pub fn closest(&self, target: u64, tolerance: u64) -> Option<usize> {
        self.index
            .iter()
            .enumerate()
            .map(|(position, meta)| (position, meta.aligned.abs_diff(target)))
            .filter(|&(_, distance)| distance <= tolerance)
            .min_by_key(|&(_, distance)| distance)
            .map(|(position, _)| position)
    }

    /// Remove the item at `position`, skipping everything buffered before it
    ///
    /// Returns the item and the number of skipped items.
    pub fn take_at(&mut self, position: usize) -> Option<(TimedItem<P>, usize)> {
        if position >= self.index.occupied_len() {
            return None;
        }

        let mut skipped = 0;
        for _ in 0..position {
            if let Some(meta) = self.index.try_pop() {
                self.storage.remove(meta.slab_key);
                skipped += 1;
            }
        }

        let meta = self.index.try_pop()?;
        Some((self.storage.remove(meta.slab_key), skipped))
    }

    pub fn len(&self) -> usize {
        self.index.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Items evicted by overflow since creation
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    fn align(&self, timestamp: u64) -> u64 {
        timestamp.saturating_add_signed(self.offset_ns)
    }
}
