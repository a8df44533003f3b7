//! Incremental activity graph construction.

use indexmap::IndexMap;

use super::traverse::{Relationship, Scope};
use super::{Activity, ActivityIdx};
use crate::error::Inconsistency;
use crate::trace::{ActivityId, TraceId, TraceRecord};

/// Arena of records and activities, fed one record at a time in
/// [`TraceRecordPosition`](crate::trace::TraceRecordPosition) order.
#[derive(Debug, Default)]
pub struct ActivityGraph {
    records: Vec<TraceRecord>,
    activities: Vec<Activity>,
    by_id: IndexMap<ActivityId, ActivityIdx>,
    inconsistencies: Vec<Inconsistency>,
}

impl ActivityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record, creating and linking activities as needed.
    pub fn append(&mut self, record: TraceRecord) -> TraceId {
        let trace_id = TraceId(self.records.len());
        let owner = self.ensure_activity(&record.activity_id);
        let target = record.transfer_target().cloned();

        {
            let activity = &mut self.activities[owner.0];
            activity.records.push(trace_id);
            activity.widen_span(record.time);
            if activity.name.is_none() {
                activity.name = record.activity_name.clone();
            }
        }
        self.records.push(record);

        if let Some(target_id) = target {
            self.link_transfer(owner, &target_id, trace_id);
        }
        self.reclassify(owner);
        trace_id
    }

    fn ensure_activity(&mut self, id: &ActivityId) -> ActivityIdx {
        if let Some(&idx) = self.by_id.get(id) {
            return idx;
        }
        let idx = ActivityIdx(self.activities.len());
        self.activities.push(Activity::new(id.clone()));
        self.by_id.insert(id.clone(), idx);
        idx
    }

    /// Apply the single-parent rule for a transfer `source -> target_id`.
    fn link_transfer(&mut self, source: ActivityIdx, target_id: &ActivityId, transfer: TraceId) {
        let target = self.ensure_activity(target_id);
        if target == source {
            let inconsistency = Inconsistency::SelfTransfer {
                activity: target_id.clone(),
            };
            log::warn!("{inconsistency}");
            self.inconsistencies.push(inconsistency);
            return;
        }

        self.activities[target.0].transfers_in.push(transfer);

        if self.relationship(source, target, &Scope::unscoped()) != Relationship::None {
            return;
        }

        match self.activities[target.0].parent {
            None => {
                let child = &mut self.activities[target.0];
                child.parent = Some(source);
                child.parent_transfer = Some(transfer);
                self.activities[source.0].children.push(target);
                self.reclassify(target);
            }
            Some(kept) => {
                let inconsistency = Inconsistency::ParentConflict {
                    child: target_id.clone(),
                    kept: self.activities[kept.0].id.clone(),
                    rejected: self.activities[source.0].id.clone(),
                };
                log::warn!("{inconsistency}");
                self.inconsistencies.push(inconsistency);
            }
        }
    }

    fn reclassify(&mut self, idx: ActivityIdx) {
        let records = &self.records;
        let activity = &mut self.activities[idx.0];
        let sources: Vec<&str> = activity
            .records
            .iter()
            .map(|id| records[id.0].source_name.as_str())
            .collect();
        activity.classify(sources.into_iter());
    }

    pub fn get(&self, id: &ActivityId) -> Option<&Activity> {
        self.index_of(id).map(|idx| &self.activities[idx.0])
    }

    pub fn index_of(&self, id: &ActivityId) -> Option<ActivityIdx> {
        self.by_id.get(id).copied()
    }

    /// Panics on an index from another graph.
    pub fn activity(&self, idx: ActivityIdx) -> &Activity {
        &self.activities[idx.0]
    }

    pub fn record(&self, id: TraceId) -> Option<&TraceRecord> {
        self.records.get(id.0)
    }

    /// Activities in first-seen order.
    pub fn activities(&self) -> impl ExactSizeIterator<Item = (ActivityIdx, &Activity)> {
        self.activities
            .iter()
            .enumerate()
            .map(|(i, activity)| (ActivityIdx(i), activity))
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    /// Activities with no parent, in first-seen order.
    pub fn roots(&self) -> impl Iterator<Item = ActivityIdx> + '_ {
        self.activities()
            .filter(|(_, activity)| activity.parent.is_none())
            .map(|(idx, _)| idx)
    }

    /// Problems recovered from while building, in the order found.
    pub fn inconsistencies(&self) -> &[Inconsistency] {
        &self.inconsistencies
    }
}
