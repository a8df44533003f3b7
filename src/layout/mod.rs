//! Visualization coordinates for a loaded trace.
//!
//! [`ExecutionColumns`] is maintained while records are appended. A
//! [`Layout`] is a snapshot built from it afterwards: one
//! [`ActivityColumnItem`] per (execution, activity) pair, a cell per record,
//! parent pairing for transfer arrows, and timestamp rows.

use std::collections::HashMap;

use crate::activity::ActivityGraph;

mod cells;
mod columns;
mod exchange;
mod rows;


pub use cells::{ActivityColumnItem, CellDirection, CellRef, TraceRecordCellItem};
pub use columns::ExecutionColumns;
pub use exchange::{
    ExchangeCorrelation, ExchangeEnd, MessageExchangeCellItem, correlate_message_exchanges,
};
pub use rows::HorzBundRowItem;

use crate::trace::TraceId;

/// Cells of every activity in every execution column.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    columns: Vec<Vec<ActivityColumnItem>>,
    owned: HashMap<TraceId, CellRef>,
    rows: Vec<HorzBundRowItem>,
}

impl Layout {
    pub fn build(graph: &ActivityGraph, executions: &ExecutionColumns) -> Self {
        let mut columns: Vec<Vec<ActivityColumnItem>> = (0..executions.len())
            .map(|column| {
                executions
                    .activities(column)
                    .enumerate()
                    .map(|(index, activity)| ActivityColumnItem::new(column, index, activity))
                    .collect()
            })
            .collect();
        let mut owned = HashMap::new();

        for (i, record) in graph.records().iter().enumerate() {
            let trace = TraceId(i);
            let (Some(column), Some(owner)) = (
                executions.column_of(&record.execution),
                graph.index_of(&record.activity_id),
            ) else {
                continue;
            };
            let Some(item) = executions.activity_index(column, owner) else {
                continue;
            };
            let here = CellRef {
                column,
                item,
                trace,
            };
            columns[column][item].append(TraceRecordCellItem::new(
                trace,
                owner,
                CellDirection::Owned,
                record.related_activity_id.clone(),
            ));
            owned.insert(trace, here);

            let Some(target) = record.transfer_target().and_then(|id| graph.index_of(id)) else {
                continue;
            };
            if target == owner {
                continue;
            }
            // The target only gets a transfer-in cell where it has records of its own.
            let Some(target_item) = executions.activity_index(column, target) else {
                continue;
            };
            let mut incoming = TraceRecordCellItem::new(
                trace,
                target,
                CellDirection::TransferIn,
                Some(record.activity_id.clone()),
            );
            incoming.related_cell = Some(here);
            if columns[column][target_item].append(incoming)
                && let Some(cell) = columns[column][item].cell_mut(trace)
            {
                cell.related_cell = Some(CellRef {
                    column,
                    item: target_item,
                    trace,
                });
            }
        }

        for items in &mut columns {
            let by_activity: HashMap<_, _> = items
                .iter()
                .map(|item| (item.activity(), item.index()))
                .collect();
            for item in items.iter_mut() {
                item.paired_activity_index = graph
                    .activity(item.activity())
                    .parent()
                    .and_then(|parent| by_activity.get(&parent).copied());
            }
        }

        let rows = rows::build_rows(graph, &columns);
        log::debug!(
            "Built layout: {} columns, {} rows",
            columns.len(),
            rows.len()
        );
        Self {
            columns,
            owned,
            rows,
        }
    }

    pub fn columns(&self) -> &[Vec<ActivityColumnItem>] {
        &self.columns
    }

    /// Items of one column; empty for an unknown column.
    pub fn column(&self, column: usize) -> &[ActivityColumnItem] {
        self.columns.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn item(&self, column: usize, index: usize) -> Option<&ActivityColumnItem> {
        self.columns.get(column)?.get(index)
    }

    /// Mutable access for the drawing pass (see [`ActivityColumnItem::mark_drawn`]).
    pub fn item_mut(&mut self, column: usize, index: usize) -> Option<&mut ActivityColumnItem> {
        self.columns.get_mut(column)?.get_mut(index)
    }

    /// Cell for `trace` in `item`, if that item shows it.
    pub fn get_cell<'a>(
        &self,
        item: &'a ActivityColumnItem,
        trace: TraceId,
    ) -> Option<&'a TraceRecordCellItem> {
        item.cell(trace)
    }

    pub fn cell(&self, at: CellRef) -> Option<&TraceRecordCellItem> {
        self.item(at.column, at.item)?.cell(at.trace)
    }

    /// Where the owning activity shows `trace`.
    pub fn cell_ref(&self, trace: TraceId) -> Option<CellRef> {
        self.owned.get(&trace).copied()
    }

    pub fn rows(&self) -> &[HorzBundRowItem] {
        &self.rows
    }

    /// Point the sent and received cells of each exchange at each other.
    pub fn link_exchanges(&mut self, correlation: &ExchangeCorrelation) {
        for exchange in &correlation.exchanges {
            let (Some(sent), Some(received)) = (
                self.cell_ref(exchange.sent.trace),
                self.cell_ref(exchange.received.trace),
            ) else {
                continue;
            };
            for (from, to) in [(sent, received), (received, sent)] {
                if let Some(cell) = self
                    .columns
                    .get_mut(from.column)
                    .and_then(|items| items.get_mut(from.item))
                    .and_then(|item| item.cell_mut(from.trace))
                {
                    cell.related_cell = Some(to);
                }
            }
        }
    }
}
