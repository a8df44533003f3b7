//! Activities and the graph built from transfer records.
//!
//! Activities live in an arena owned by [`ActivityGraph`] and refer to each
//! other by [`ActivityIdx`]; records are referred to by
//! [`TraceId`](crate::trace::TraceId). Parent links are plain indices, so the
//! parent/child cycle needs no shared ownership.

use chrono::{DateTime, Utc};

use crate::trace::{ActivityId, TraceId};

mod compare;
mod graph;
mod traverse;


pub use compare::{
    SortOrder, compare_duration, compare_end_time, compare_start_time, compare_trace_time,
};
pub use graph::ActivityGraph;
pub use traverse::{Relationship, Scope};

/// Index of an activity in its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivityIdx(pub usize);

/// Coarse role of an activity, used to pick icons and grouping in views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ActivityType {
    Root,
    ServiceHost,
    Listen,
    Connection,
    Message,
    UserCodeExecution,
    Normal,
    #[default]
    Unknown,
}

/// Keyword table checked in order against the activity name (or, lacking
/// one, the source names of its records). Matching is case-insensitive.
const TYPE_KEYWORDS: &[(&str, ActivityType)] = &[
    ("servicehost", ActivityType::ServiceHost),
    ("user code", ActivityType::UserCodeExecution),
    ("listen", ActivityType::Listen),
    ("connection", ActivityType::Connection),
    ("process action", ActivityType::Message),
    ("message", ActivityType::Message),
];

/// A logical unit of work: every record sharing one activity id.
#[derive(Debug, Clone)]
pub struct Activity {
    pub(crate) id: ActivityId,
    pub(crate) name: Option<String>,
    pub(crate) activity_type: ActivityType,
    pub(crate) start_time: Option<DateTime<Utc>>,
    pub(crate) end_time: Option<DateTime<Utc>>,
    pub(crate) parent: Option<ActivityIdx>,
    pub(crate) parent_transfer: Option<TraceId>,
    pub(crate) children: Vec<ActivityIdx>,
    pub(crate) records: Vec<TraceId>,
    pub(crate) transfers_in: Vec<TraceId>,
}

impl Activity {
    pub(crate) fn new(id: ActivityId) -> Self {
        Self {
            id,
            name: None,
            activity_type: ActivityType::Unknown,
            start_time: None,
            end_time: None,
            parent: None,
            parent_transfer: None,
            children: Vec::new(),
            records: Vec::new(),
            transfers_in: Vec::new(),
        }
    }

    pub fn id(&self) -> &ActivityId {
        &self.id
    }

    /// Name reported by the first record that carried one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    /// Time of the earliest owned record; `None` until one is seen.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Time of the latest owned record; `None` until one is seen.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// `end - start`, or `None` while either is unknown or the span is negative.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<ActivityIdx> {
        self.parent
    }

    /// The transfer record that made `parent` this activity's parent.
    pub fn parent_transfer(&self) -> Option<TraceId> {
        self.parent_transfer
    }

    pub fn children(&self) -> &[ActivityIdx] {
        &self.children
    }

    /// Records owned by this activity, in append order.
    pub fn records(&self) -> &[TraceId] {
        &self.records
    }

    /// Transfer records owned by other activities that target this one.
    pub fn transfers_in(&self) -> &[TraceId] {
        &self.transfers_in
    }

    pub(crate) fn widen_span(&mut self, time: DateTime<Utc>) {
        self.start_time = Some(self.start_time.map_or(time, |start| start.min(time)));
        self.end_time = Some(self.end_time.map_or(time, |end| end.max(time)));
    }

    /// Recompute `activity_type` from what is known so far.
    pub(crate) fn classify<'a>(&mut self, source_names: impl Iterator<Item = &'a str>) {
        self.activity_type = if self.records.is_empty() {
            ActivityType::Unknown
        } else if self.id.is_empty() {
            ActivityType::Root
        } else if let Some(found) = self
            .name
            .as_deref()
            .and_then(keyword_type)
            .or_else(|| source_names.filter_map(keyword_type).next())
        {
            found
        } else if self.parent.is_none() {
            ActivityType::Root
        } else {
            ActivityType::Normal
        };
    }
}

fn keyword_type(text: &str) -> Option<ActivityType> {
    let lowered = text.to_ascii_lowercase();
    TYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|&(_, ty)| ty)
}
