//! Composite - SynchronizerLoop output
//!
//! One rendered grid per completed cycle.

use serde::{Deserialize, Serialize};

use crate::TimedItem;

/// Grid dimensions for N sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub rows: usize,
    pub cols: usize,
}

impl GridLayout {
    /// `cols = ceil(sqrt(n))`, `rows = ceil(n / cols)`
    ///
    /// Computed in integers so perfect squares never round up.
    pub fn for_sources(n: usize) -> Self {
        if n == 0 {
            return Self { rows: 0, cols: 0 };
        }

        let mut cols = (n as f64).sqrt() as usize;
        while cols * cols < n {
            cols += 1;
        }
        while cols > 1 && (cols - 1) * (cols - 1) >= n {
            cols -= 1;
        }

        Self {
            rows: n.div_ceil(cols),
            cols,
        }
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// (row, col) of a row-major cell index
    pub fn position(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }
}

/// One grid cell
#[derive(Debug, Clone)]
pub enum GridCell<P> {
    /// Frame contributed by a source this cycle
    Source(TimedItem<P>),
    /// Blank placeholder for cells beyond N
    Blank(P),
}

impl<P> GridCell<P> {
    /// Payload drawn in this cell
    pub fn payload(&self) -> &P {
        match self {
            GridCell::Source(item) => item.payload(),
            GridCell::Blank(blank) => blank,
        }
    }

    /// Whether this cell is a placeholder
    pub fn is_blank(&self) -> bool {
        matches!(self, GridCell::Blank(_))
    }
}

/// Timestamp diagnostics of one frame set
///
/// Observability only: no threshold rejects a desynchronized set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncDiagnostics {
    /// Timestamp of source 0 (ns)
    pub reference_timestamp: u64,

    /// `ts[i] - ts[0]` per source index (ns); entry 0 is always 0
    pub offsets_ns: Vec<i64>,
}

impl SyncDiagnostics {
    /// Compute offsets relative to source 0
    pub fn from_timestamps(timestamps: &[u64]) -> Self {
        let reference_timestamp = timestamps.first().copied().unwrap_or_default();
        let offsets_ns = timestamps
            .iter()
            .map(|&ts| ts.wrapping_sub(reference_timestamp) as i64)
            .collect();

        Self {
            reference_timestamp,
            offsets_ns,
        }
    }

    /// Largest absolute offset in the set
    pub fn max_abs_offset_ns(&self) -> u64 {
        self.offsets_ns
            .iter()
            .map(|offset| offset.unsigned_abs())
            .max()
            .unwrap_or(0)
    }
}

/// Synchronized composite
#[derive(Debug, Clone)]
pub struct Composite<P> {
    /// Completed cycle sequence number (monotonically increasing, from 1)
    pub cycle_id: u64,

    /// Grid dimensions
    pub layout: GridLayout,

    /// Row-major cells, `layout.cell_count()` long
    pub cells: Vec<GridCell<P>>,

    /// Timestamp diagnostics
    pub diagnostics: SyncDiagnostics,
}

impl<P> Composite<P> {
    /// Number of cells filled by real frames
    pub fn source_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_blank()).count()
    }

    /// Number of placeholder cells
    pub fn blank_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_blank()).count()
    }

    /// Frames contributed by sources, in source order
    pub fn items(&self) -> impl Iterator<Item = &TimedItem<P>> {
        self.cells.iter().filter_map(|cell| match cell {
            GridCell::Source(item) => Some(item),
            GridCell::Blank(_) => None,
        })
    }
}
