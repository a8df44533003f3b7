//! Per-activity cells: one cell per record shown in an activity's column.

use std::cell::OnceCell;

use indexmap::IndexMap;

use crate::activity::{ActivityGraph, ActivityIdx, Relationship, Scope};
use crate::trace::{ActivityId, TraceId};

/// Address of a cell inside a [`Layout`](super::Layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub column: usize,
    /// Index of the [`ActivityColumnItem`] within its column.
    pub item: usize,
    pub trace: TraceId,
}

/// Whether the cell's record belongs to the activity or only points at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellDirection {
    /// The record is owned by the cell's activity.
    Owned,
    /// A transfer owned by another activity that targets this one.
    TransferIn,
}

/// One trace record placed in an activity column.
#[derive(Debug, Clone)]
pub struct TraceRecordCellItem {
    trace: TraceId,
    activity: ActivityIdx,
    direction: CellDirection,
    related_activity: Option<ActivityId>,
    pub(crate) related_cell: Option<CellRef>,
    to_child_transfer: OnceCell<bool>,
}

impl TraceRecordCellItem {
    pub fn new(
        trace: TraceId,
        activity: ActivityIdx,
        direction: CellDirection,
        related_activity: Option<ActivityId>,
    ) -> Self {
        Self {
            trace,
            activity,
            direction,
            related_activity,
            related_cell: None,
            to_child_transfer: OnceCell::new(),
        }
    }

    pub fn trace(&self) -> TraceId {
        self.trace
    }

    pub fn activity(&self) -> ActivityIdx {
        self.activity
    }

    pub fn direction(&self) -> CellDirection {
        self.direction
    }

    /// The activity at the other end: the transfer target for owned cells,
    /// the transferring activity for transfer-in cells.
    pub fn related_activity(&self) -> Option<&ActivityId> {
        self.related_activity.as_ref()
    }

    /// Cell at the other end of a transfer or message exchange.
    pub fn related_cell(&self) -> Option<CellRef> {
        self.related_cell
    }

    /// This cell holds the transfer that gave its activity its parent.
    pub fn is_parent_transfer_in(&self, graph: &ActivityGraph) -> bool {
        self.direction == CellDirection::TransferIn
            && graph.activity(self.activity).parent_transfer() == Some(self.trace)
    }

    /// Whether this transfer leads into a descendant of the cell's activity
    /// other than a direct child.
    ///
    /// Evaluated on first call and cached for the life of the cell, even if
    /// the graph changes afterwards.
    pub fn is_to_child_transfer(&self, graph: &ActivityGraph, scope: &Scope) -> bool {
        *self
            .to_child_transfer
            .get_or_init(|| self.compute_to_child_transfer(graph, scope))
    }

    /// `Some` once [`is_to_child_transfer`](Self::is_to_child_transfer) has run.
    pub fn cached_to_child_transfer(&self) -> Option<bool> {
        self.to_child_transfer.get().copied()
    }

    fn compute_to_child_transfer(&self, graph: &ActivityGraph, scope: &Scope) -> bool {
        let is_transfer = graph.record(self.trace).is_some_and(|r| r.is_transfer());
        if !is_transfer || self.is_parent_transfer_in(graph) {
            return false;
        }
        let Some(related) = self.related_activity.as_ref().and_then(|id| graph.index_of(id))
        else {
            return false;
        };
        if graph.relationship(self.activity, related, scope) != Relationship::None
            || graph.relationship(related, self.activity, scope) != Relationship::None
        {
            return false;
        }
        graph.descendants(self.activity, scope).contains(&related)
    }
}

/// One activity as it appears in one execution column.
#[derive(Debug, Clone)]
pub struct ActivityColumnItem {
    column: usize,
    index: usize,
    activity: ActivityIdx,
    pub(crate) paired_activity_index: Option<usize>,
    cells: IndexMap<TraceId, TraceRecordCellItem>,
    drawn: usize,
}

impl ActivityColumnItem {
    pub fn new(column: usize, index: usize, activity: ActivityIdx) -> Self {
        Self {
            column,
            index,
            activity,
            paired_activity_index: None,
            cells: IndexMap::new(),
            drawn: 0,
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Position of this item within its column.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn activity(&self) -> ActivityIdx {
        self.activity
    }

    /// Index, in the same column, of the parent activity's item.
    pub fn paired_activity_index(&self) -> Option<usize> {
        self.paired_activity_index
    }

    /// Add a cell; a second cell for the same trace id is dropped.
    /// Returns whether the cell was added.
    pub fn append(&mut self, cell: TraceRecordCellItem) -> bool {
        if self.cells.contains_key(&cell.trace) {
            return false;
        }
        self.cells.insert(cell.trace, cell);
        true
    }

    pub fn cell(&self, trace: TraceId) -> Option<&TraceRecordCellItem> {
        self.cells.get(&trace)
    }

    pub(crate) fn cell_mut(&mut self, trace: TraceId) -> Option<&mut TraceRecordCellItem> {
        self.cells.get_mut(&trace)
    }

    /// Cells in insertion order.
    pub fn cells(&self) -> impl ExactSizeIterator<Item = &TraceRecordCellItem> {
        self.cells.values()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Record that the layout pass drew one more cell of this item.
    pub fn mark_drawn(&mut self) {
        self.drawn = (self.drawn + 1).min(self.cells.len());
    }

    pub fn drawn_count(&self) -> usize {
        self.drawn
    }

    /// True while the layout pass is part-way through this activity.
    pub fn within_activity_boundary(&self) -> bool {
        self.drawn > 0 && self.drawn < self.cells.len()
    }
}
