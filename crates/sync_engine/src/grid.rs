//! Frame set → grid composite

use contracts::{Composite, GridCell, GridLayout, Placeholder, SyncDiagnostics, TimedItem};

/// Arrange a complete frame set row-major into a near-square grid
///
/// Cells past the last source are filled with `blank_like` of the first
/// frame. Returns `None` for an empty set.
pub fn compose<P: Placeholder>(cycle_id: u64, items: Vec<TimedItem<P>>) -> Option<Composite<P>> {
    let blank = items.first()?.payload().blank_like();

    let timestamps: Vec<u64> = items.iter().map(TimedItem::timestamp).collect();
    let diagnostics = SyncDiagnostics::from_timestamps(&timestamps);
    let layout = GridLayout::for_sources(items.len());

    let mut cells: Vec<GridCell<P>> = Vec::with_capacity(layout.cell_count());
    cells.extend(items.into_iter().map(GridCell::Source));
    while cells.len() < layout.cell_count() {
        cells.push(GridCell::Blank(blank.blank_like()));
    }

    Some(Composite {
        cycle_id,
        layout,
        cells,
        diagnostics,
    })
}
