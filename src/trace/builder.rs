//! Building records without a file, for parsers other than the JSONL reader.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use super::position::{SourceFile, TraceRecordPosition};
use super::record::{
    ActivityId, ExecutionInfo, MessageDirection, MessageInfo, TraceEventType, TraceLevel,
    TraceRecord,
};

/// Next offset handed to a record built without a position.
static NEXT_MEMORY_OFFSET: AtomicU64 = AtomicU64::new(0);

/// Step-by-step construction of a [`TraceRecord`].
///
/// ```ignore
/// let record = TraceRecordBuilder::new("a", time)
///     .event_type(TraceEventType::Transfer)
///     .related("b")
///     .position(&file, 120)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TraceRecordBuilder {
    activity_id: ActivityId,
    time: DateTime<Utc>,
    related: Option<ActivityId>,
    event_type: TraceEventType,
    level: TraceLevel,
    source_name: String,
    activity_name: Option<String>,
    execution: ExecutionInfo,
    trace_code: Option<String>,
    message: Option<MessageInfo>,
    payload: serde_json::Value,
    position: Option<(Arc<SourceFile>, u64)>,
}

impl TraceRecordBuilder {
    pub fn new(activity_id: &str, time: DateTime<Utc>) -> Self {
        Self {
            activity_id: ActivityId::normalize(activity_id),
            time,
            related: None,
            event_type: TraceEventType::default(),
            level: TraceLevel::default(),
            source_name: String::new(),
            activity_name: None,
            execution: ExecutionInfo::new("", "", None),
            trace_code: None,
            message: None,
            payload: serde_json::Value::Null,
            position: None,
        }
    }

    pub fn event_type(mut self, event_type: TraceEventType) -> Self {
        self.event_type = event_type;
        self
    }

    /// Shorthand for a transfer to `target`.
    pub fn transfer_to(self, target: &str) -> Self {
        self.event_type(TraceEventType::Transfer).related(target)
    }

    pub fn related(mut self, related: &str) -> Self {
        self.related = Some(ActivityId::normalize(related));
        self
    }

    pub fn level(mut self, level: TraceLevel) -> Self {
        self.level = level;
        self
    }

    pub fn source(mut self, source_name: &str) -> Self {
        self.source_name = source_name.to_string();
        self
    }

    pub fn activity_name(mut self, name: &str) -> Self {
        self.activity_name = Some(name.to_string());
        self
    }

    pub fn execution(mut self, execution: ExecutionInfo) -> Self {
        self.execution = execution;
        self
    }

    pub fn trace_code(mut self, code: &str) -> Self {
        self.trace_code = Some(code.to_string());
        self
    }

    /// Attach a message with the given direction and message id.
    pub fn message(mut self, direction: MessageDirection, id: &str) -> Self {
        self.message = Some(MessageInfo {
            direction,
            id: Some(id.to_string()),
            relates_to: None,
            activity: None,
        });
        self
    }

    pub fn message_info(mut self, info: MessageInfo) -> Self {
        self.message = Some(info);
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn position(mut self, file: &Arc<SourceFile>, offset: u64) -> Self {
        self.position = Some((Arc::clone(file), offset));
        self
    }

    /// Records built without a position share an unnamed in-memory file, with
    /// offsets in build order.
    pub fn build(self) -> TraceRecord {
        let (file, offset) = self.position.unwrap_or_else(|| {
            (
                SourceFile::new("<memory>"),
                NEXT_MEMORY_OFFSET.fetch_add(1, Ordering::Relaxed),
            )
        });
        TraceRecord {
            activity_id: self.activity_id,
            related_activity_id: self.related,
            event_type: self.event_type,
            time: self.time,
            level: self.level,
            source_name: self.source_name,
            activity_name: self.activity_name,
            execution: self.execution,
            trace_code: self.trace_code,
            message: self.message,
            payload: self.payload,
            position: TraceRecordPosition::new(
                file,
                offset,
                self.time,
                self.event_type.type_priority(),
            ),
        }
    }
}
