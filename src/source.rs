//! The queryable result of loading traces.

use std::sync::{Arc, Mutex};

use crate::activity::{Activity, ActivityGraph, ActivityIdx, Relationship, Scope};
use crate::config::TraceConfig;
use crate::layout::{ExchangeCorrelation, ExecutionColumns, Layout, correlate_message_exchanges};
use crate::trace::{ActivityId, ExecutionInfo, Granularity, TraceId, TraceRecord};

/// One data source behind a single coarse lock, for callers that query while
/// a load is still appending.
pub type SharedDataSource = Arc<Mutex<TraceDataSource>>;

/// Activity graph plus execution columns, fed in record order.
///
/// Records must be appended in [`compare_positions`](crate::trace::compare_positions)
/// order; [`Loader`](crate::loader::Loader) takes care of that.
#[derive(Debug, Default)]
pub struct TraceDataSource {
    graph: ActivityGraph,
    columns: ExecutionColumns,
    config: TraceConfig,
}

impl TraceDataSource {
    pub fn new(config: TraceConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn into_shared(self) -> SharedDataSource {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn granularity(&self) -> Granularity {
        self.config.granularity()
    }

    /// Scope for queries made from `execution`, honoring the cross-thread setting.
    pub fn scope(&self, execution: Option<&ExecutionInfo>) -> Scope {
        self.config.scope(execution)
    }

    pub fn append_record(&mut self, record: TraceRecord) -> TraceId {
        let execution = record.execution.clone();
        let activity_id = record.activity_id.clone();
        let trace = self.graph.append(record);
        if let Some(owner) = self.graph.index_of(&activity_id) {
            self.columns.observe(&execution, owner);
        }
        trace
    }

    pub fn graph(&self) -> &ActivityGraph {
        &self.graph
    }

    pub fn get_activity(&self, id: &ActivityId) -> Option<&Activity> {
        self.graph.get(id)
    }

    pub fn get_record(&self, trace: TraceId) -> Option<&TraceRecord> {
        self.graph.record(trace)
    }

    pub fn record_count(&self) -> usize {
        self.graph.records().len()
    }

    pub fn get_execution_columns(&self) -> &ExecutionColumns {
        &self.columns
    }

    /// Activities seen in `execution`, in first-seen order; empty when the
    /// execution is unknown.
    pub fn get_activity_columns(&self, execution: &ExecutionInfo) -> Vec<(ActivityIdx, &Activity)> {
        let Some(column) = self.columns.column_of(execution) else {
            return Vec::new();
        };
        self.columns
            .activities(column)
            .map(|idx| (idx, self.graph.activity(idx)))
            .collect()
    }

    pub fn get_child_activities(&self, root: &ActivityId, scope: &Scope) -> Vec<&Activity> {
        self.graph
            .child_activities(root, scope)
            .into_iter()
            .map(|idx| self.graph.activity(idx))
            .collect()
    }

    pub fn get_direct_relationship(
        &self,
        a: &ActivityId,
        b: &ActivityId,
        scope: &Scope,
    ) -> Relationship {
        self.graph.direct_relationship(a, b, scope)
    }

    pub fn correlate_message_exchanges(&self, traces: &[TraceId]) -> ExchangeCorrelation {
        correlate_message_exchanges(&self.graph, &self.columns, traces)
    }

    /// Every record id, in append order.
    pub fn trace_ids(&self) -> Vec<TraceId> {
        (0..self.graph.records().len()).map(TraceId).collect()
    }

    /// Build the visualization layout, with message exchanges linked.
    pub fn layout(&self) -> Layout {
        let mut layout = Layout::build(&self.graph, &self.columns);
        layout.link_exchanges(&self.correlate_message_exchanges(&self.trace_ids()));
        layout
    }
}
