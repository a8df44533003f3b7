//! Execution columns and the activities inside each.

use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};

use crate::activity::ActivityIdx;
use crate::trace::ExecutionInfo;

/// First-seen ordering of executions, and of activities within each execution.
///
/// Column `i` is the `i`-th distinct execution observed; within a column,
/// activity index `j` is the `j`-th distinct activity observed there. Feeding
/// the same sequence always gives the same coordinates.
#[derive(Debug, Default, Clone)]
pub struct ExecutionColumns {
    columns: IndexMap<ExecutionInfo, IndexSet<ActivityIdx>>,
}

impl ExecutionColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register that `activity` emitted a record in `execution`.
    /// Returns the (column, index-in-column) coordinate.
    pub fn observe(&mut self, execution: &ExecutionInfo, activity: ActivityIdx) -> (usize, usize) {
        let (column, activities) = match self.columns.entry(execution.clone()) {
            Entry::Occupied(entry) => (entry.index(), entry.into_mut()),
            Entry::Vacant(entry) => {
                log::debug!("New execution column {}", execution.label());
                (entry.index(), entry.insert(IndexSet::new()))
            }
        };
        let (index, _) = activities.insert_full(activity);
        (column, index)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn executions(&self) -> impl ExactSizeIterator<Item = &ExecutionInfo> {
        self.columns.keys()
    }

    pub fn execution(&self, column: usize) -> Option<&ExecutionInfo> {
        self.columns.get_index(column).map(|(execution, _)| execution)
    }

    pub fn column_of(&self, execution: &ExecutionInfo) -> Option<usize> {
        self.columns.get_index_of(execution)
    }

    /// Activities of a column in first-seen order; empty for an unknown column.
    pub fn activities(&self, column: usize) -> impl Iterator<Item = ActivityIdx> + '_ {
        self.columns
            .get_index(column)
            .into_iter()
            .flat_map(|(_, activities)| activities.iter().copied())
    }

    pub fn activity_count(&self, column: usize) -> usize {
        self.columns
            .get_index(column)
            .map_or(0, |(_, activities)| activities.len())
    }

    pub fn activity_index(&self, column: usize, activity: ActivityIdx) -> Option<usize> {
        self.columns
            .get_index(column)
            .and_then(|(_, activities)| activities.get_index_of(&activity))
    }

    /// Every (column, index) at which `activity` appears, by column.
    pub fn columns_of_activity(&self, activity: ActivityIdx) -> Vec<(usize, usize)> {
        self.columns
            .values()
            .enumerate()
            .filter_map(|(column, activities)| {
                activities
                    .get_index_of(&activity)
                    .map(|index| (column, index))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(process: &str) -> ExecutionInfo {
        ExecutionInfo::new("pc", process, None)
    }

    #[test]
    fn test_first_seen_order() {
        let mut columns = ExecutionColumns::new();
        assert_eq!(columns.observe(&exec("b"), ActivityIdx(4)), (0, 0));
        assert_eq!(columns.observe(&exec("a"), ActivityIdx(1)), (1, 0));
        assert_eq!(columns.observe(&exec("b"), ActivityIdx(2)), (0, 1));
        assert_eq!(columns.observe(&exec("b"), ActivityIdx(4)), (0, 0));

        assert_eq!(columns.len(), 2);
        assert_eq!(columns.column_of(&exec("a")), Some(1));
        assert_eq!(columns.column_of(&exec("zzz")), None);
        assert_eq!(
            columns.activities(0).collect::<Vec<_>>(),
            [ActivityIdx(4), ActivityIdx(2)]
        );
        assert_eq!(columns.activity_count(1), 1);
        assert_eq!(columns.activity_index(0, ActivityIdx(2)), Some(1));
        assert_eq!(columns.activity_index(7, ActivityIdx(2)), None);
        assert_eq!(columns.activities(9).count(), 0);
    }

    #[test]
    fn test_activity_in_several_columns() {
        let mut columns = ExecutionColumns::new();
        columns.observe(&exec("client"), ActivityIdx(0));
        columns.observe(&exec("server"), ActivityIdx(1));
        columns.observe(&exec("server"), ActivityIdx(0));
        assert_eq!(
            columns.columns_of_activity(ActivityIdx(0)),
            vec![(0, 0), (1, 1)]
        );
        let labels: Vec<String> = columns.executions().map(ExecutionInfo::label).collect();
        assert_eq!(labels, ["pc/client", "pc/server"]);
    }
}
