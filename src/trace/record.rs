//! Parsed trace records and the identities they carry.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::position::TraceRecordPosition;

/// Dense id of a record inside one [`ActivityGraph`](crate::activity::ActivityGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId(pub usize);

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Normalized activity identifier.
///
/// GUIDs in any accepted spelling (bare, hyphenated, braced, any case) become
/// the lowercase braced form. Anything else is kept trimmed and lowercased so
/// that malformed ids still group consistently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivityId(String);

impl ActivityId {
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        match uuid::Uuid::parse_str(trimmed) {
            Ok(guid) => Self(guid.braced().to_string()),
            Err(_) => Self(trimmed.to_ascii_lowercase()),
        }
    }

    /// The all-zero GUID, used by emitters for "no activity".
    pub fn empty() -> Self {
        Self(uuid::Uuid::nil().braced().to_string())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How finely executions are distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// One execution per (computer, process).
    #[default]
    Process,
    /// One execution per (computer, process, thread).
    Thread,
}

/// The (computer, process, optional thread) context a record was emitted from.
///
/// Two values are equal when the computer name, the process identity (id when
/// known, otherwise name) and the thread id all match. `thread_id` is only
/// filled in thread granularity.
#[derive(Debug, Clone)]
pub struct ExecutionInfo {
    pub computer_name: String,
    pub process_name: String,
    pub process_id: Option<u32>,
    pub thread_id: Option<String>,
}

#[derive(PartialEq, Eq, Hash)]
enum ProcessIdentity<'a> {
    Id(u32),
    Name(&'a str),
}

impl ExecutionInfo {
    pub fn new(
        computer_name: impl Into<String>,
        process_name: impl Into<String>,
        process_id: Option<u32>,
    ) -> Self {
        Self {
            computer_name: computer_name.into(),
            process_name: process_name.into(),
            process_id,
            thread_id: None,
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    fn process_identity(&self) -> ProcessIdentity<'_> {
        match self.process_id {
            Some(id) => ProcessIdentity::Id(id),
            None => ProcessIdentity::Name(&self.process_name),
        }
    }

    /// Equality ignoring the thread.
    pub fn same_process(&self, other: &Self) -> bool {
        self.computer_name == other.computer_name
            && self.process_identity() == other.process_identity()
    }

    /// Short label for display, e.g. `web01/svc.exe:1234` or `web01/svc.exe:1234#7`.
    pub fn label(&self) -> String {
        let mut label = format!("{}/{}", self.computer_name, self.process_name);
        if let Some(id) = self.process_id {
            label.push_str(&format!(":{id}"));
        }
        if let Some(thread) = &self.thread_id {
            label.push_str(&format!("#{thread}"));
        }
        label
    }
}

impl PartialEq for ExecutionInfo {
    fn eq(&self, other: &Self) -> bool {
        self.same_process(other) && self.thread_id == other.thread_id
    }
}

impl Eq for ExecutionInfo {}

impl Hash for ExecutionInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.computer_name.hash(state);
        self.process_identity().hash(state);
        self.thread_id.hash(state);
    }
}

/// Activity-tracing event type of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum TraceEventType {
    Start,
    Stop,
    Suspend,
    Resume,
    Transfer,
    /// Plain trace output with no activity-tracing meaning.
    #[default]
    Trace,
}

impl TraceEventType {
    /// Priority used to order records sharing a timestamp; higher sorts first.
    pub fn type_priority(self) -> i32 {
        match self {
            Self::Start => 5,
            Self::Resume => 4,
            Self::Transfer => 3,
            Self::Trace => 2,
            Self::Suspend | Self::Stop => 1,
        }
    }
}

/// Severity of a record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum TraceLevel {
    Critical,
    Error,
    Warning,
    #[default]
    Information,
    Verbose,
}

/// Direction of a message record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
pub enum MessageDirection {
    Sent,
    Received,
    /// Processing trace about a message that neither sends nor receives it.
    Related,
}

/// Message headers extracted upstream from the record payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageInfo {
    pub direction: MessageDirection,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub relates_to: Option<String>,
    #[serde(default)]
    pub activity: Option<String>,
}

impl MessageInfo {
    /// Key used to pair records: message id, else `RelatesTo`, else the
    /// activity header.
    pub fn correlation_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or(self.relates_to.as_deref())
            .or(self.activity.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// One parsed trace event. Immutable once built.
#[derive(Debug, Clone)]
pub struct TraceRecord {
    pub activity_id: ActivityId,
    pub related_activity_id: Option<ActivityId>,
    pub event_type: TraceEventType,
    pub time: DateTime<Utc>,
    pub level: TraceLevel,
    pub source_name: String,
    pub activity_name: Option<String>,
    pub execution: ExecutionInfo,
    pub trace_code: Option<String>,
    pub message: Option<MessageInfo>,
    pub payload: serde_json::Value,
    pub position: TraceRecordPosition,
}

impl TraceRecord {
    pub fn is_transfer(&self) -> bool {
        self.event_type == TraceEventType::Transfer
    }

    /// Target of a transfer, when this record is one and names a target.
    pub fn transfer_target(&self) -> Option<&ActivityId> {
        if self.is_transfer() {
            self.related_activity_id.as_ref()
        } else {
            None
        }
    }
}
