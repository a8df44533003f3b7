//! Comparators for sorting activities and records in list views.
//!
//! All of them are total orders usable with `sort_by`; `Descending` reverses
//! the complete comparison, tie-breaks included.

use std::cmp::Ordering;

use super::Activity;
use crate::trace::{TraceRecord, compare_positions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Records by their position in the merged stream.
pub fn compare_trace_time(a: &TraceRecord, b: &TraceRecord, order: SortOrder) -> Ordering {
    order.apply(compare_positions(&a.position, &b.position))
}

/// Activities by `end - start`; an unknown or negative span counts as zero.
pub fn compare_duration(a: &Activity, b: &Activity, order: SortOrder) -> Ordering {
    let span = |activity: &Activity| activity.duration().unwrap_or_else(chrono::Duration::zero);
    order.apply(span(a).cmp(&span(b)))
}

/// Activities by start time; on a tie the later end sorts first.
pub fn compare_start_time(a: &Activity, b: &Activity, order: SortOrder) -> Ordering {
    order.apply(
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| b.end_time.cmp(&a.end_time)),
    )
}

/// Activities by end time; on a tie the earlier start sorts first.
pub fn compare_end_time(a: &Activity, b: &Activity, order: SortOrder) -> Ordering {
    order.apply(
        a.end_time
            .cmp(&b.end_time)
            .then_with(|| a.start_time.cmp(&b.start_time)),
    )
}
