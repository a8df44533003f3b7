//! Timestamp-aligned rows across all execution columns.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::cells::{ActivityColumnItem, CellRef};
use crate::activity::ActivityGraph;
use crate::trace::compare_positions;

/// All cells whose records share one timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HorzBundRowItem {
    pub time: DateTime<Utc>,
    /// Cells in record order (see [`compare_positions`]); a transfer appears
    /// once per column that shows it.
    pub cells: Vec<CellRef>,
}

/// Group every cell of `columns` into one row per distinct timestamp.
pub(crate) fn build_rows(
    graph: &ActivityGraph,
    columns: &[Vec<ActivityColumnItem>],
) -> Vec<HorzBundRowItem> {
    let mut by_time: BTreeMap<DateTime<Utc>, Vec<CellRef>> = BTreeMap::new();
    for (column, items) in columns.iter().enumerate() {
        for (item, activity_item) in items.iter().enumerate() {
            for cell in activity_item.cells() {
                let Some(record) = graph.record(cell.trace()) else {
                    continue;
                };
                by_time.entry(record.time).or_default().push(CellRef {
                    column,
                    item,
                    trace: cell.trace(),
                });
            }
        }
    }

    by_time
        .into_iter()
        .map(|(time, mut cells)| {
            cells.sort_by(|a, b| {
                let position = |c: &CellRef| graph.record(c.trace).map(|r| &r.position);
                let by_record = match (position(a), position(b)) {
                    (Some(pa), Some(pb)) => compare_positions(pa, pb),
                    _ => a.trace.cmp(&b.trace),
                };
                by_record.then_with(|| (a.column, a.item).cmp(&(b.column, b.item)))
            });
            HorzBundRowItem { time, cells }
        })
        .collect()
}
