//! JSON-lines trace file reader.
//!
//! One record per line:
//!
//! ```text
//! {"activity_id":"{…}","type":"Transfer","related_activity_id":"{…}","time":"2024-05-01T10:00:00Z",
//!  "source":"System.ServiceModel","computer":"web01","process":"svc.exe","pid":1234,"thread":"7"}
//! ```
//!
//! The position of each record is the byte offset where its line starts.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::position::{SourceFile, TraceRecordPosition};
use super::record::{
    ActivityId, ExecutionInfo, Granularity, MessageInfo, TraceEventType, TraceLevel, TraceRecord,
};
use crate::error::TraceError;

#[derive(Debug, Deserialize)]
struct RawRecord {
    activity_id: String,
    #[serde(default)]
    related_activity_id: Option<String>,
    #[serde(default, rename = "type")]
    event_type: Option<String>,
    time: String,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    activity_name: Option<String>,
    #[serde(default)]
    computer: Option<String>,
    #[serde(default)]
    process: Option<String>,
    #[serde(default)]
    pid: Option<i64>,
    #[serde(default)]
    thread: Option<String>,
    #[serde(default)]
    trace_code: Option<String>,
    #[serde(default)]
    message: Option<MessageInfo>,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Parse one line into a record located at `offset` in `file`.
///
/// Returns a short description of the problem on failure; callers attach the
/// file and offset.
pub fn parse_line(
    line: &str,
    file: &Arc<SourceFile>,
    offset: u64,
    granularity: Granularity,
) -> Result<TraceRecord, String> {
    let raw: RawRecord = serde_json::from_str(line).map_err(|e| e.to_string())?;

    let event_type = match raw.event_type.as_deref() {
        Some(text) => text
            .parse::<TraceEventType>()
            .map_err(|_| format!("unknown event type '{text}'"))?,
        None => TraceEventType::default(),
    };
    let level = match raw.level.as_deref() {
        Some(text) => text
            .parse::<TraceLevel>()
            .map_err(|_| format!("unknown level '{text}'"))?,
        None => TraceLevel::default(),
    };
    let time = DateTime::parse_from_rfc3339(&raw.time)
        .map_err(|e| format!("invalid time '{}': {e}", raw.time))?
        .with_timezone(&Utc);

    if raw.activity_id.trim().is_empty() {
        return Err("empty activity_id".to_string());
    }
    let related_activity_id = raw
        .related_activity_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(ActivityId::normalize);

    // Negative ids (conventionally -1) mean the emitter did not know the pid.
    let process_id = raw.pid.and_then(|pid| u32::try_from(pid).ok());
    let mut execution = ExecutionInfo::new(
        raw.computer.unwrap_or_default(),
        raw.process.unwrap_or_default(),
        process_id,
    );
    if granularity == Granularity::Thread {
        execution = execution.with_thread(raw.thread.unwrap_or_default());
    }

    Ok(TraceRecord {
        activity_id: ActivityId::normalize(&raw.activity_id),
        related_activity_id,
        event_type,
        time,
        level,
        source_name: raw.source.unwrap_or_default(),
        activity_name: raw.activity_name,
        execution,
        trace_code: raw.trace_code,
        message: raw.message,
        payload: raw.payload,
        position: TraceRecordPosition::new(
            Arc::clone(file),
            offset,
            time,
            event_type.type_priority(),
        ),
    })
}

/// Counts from one pass over a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub records: usize,
    pub skipped: usize,
    /// The callback asked to stop before the end of the file.
    pub stopped: bool,
}

/// Streams records out of one trace file.
pub struct TraceFileReader {
    path: PathBuf,
    file: Arc<SourceFile>,
    granularity: Granularity,
    skip_malformed: bool,
}

impl TraceFileReader {
    /// Validate `path` and prepare to read it.
    pub fn open(path: &Path, granularity: Granularity) -> Result<Self, TraceError> {
        let metadata = std::fs::metadata(path).map_err(|e| TraceError::InvalidFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(TraceError::InvalidFile {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            file: SourceFile::new(path),
            granularity,
            skip_malformed: true,
        })
    }

    /// When off, the first malformed line aborts the read.
    pub fn skip_malformed(mut self, skip: bool) -> Self {
        self.skip_malformed = skip;
        self
    }

    pub fn source_file(&self) -> &Arc<SourceFile> {
        &self.file
    }

    /// Feed every record to `callback` in file order.
    ///
    /// A final line without a newline that does not parse is reported as
    /// [`TraceError::ReaderEof`]; records before it have already been
    /// delivered.
    pub fn for_each<F>(&self, mut callback: F) -> Result<ReadStats, TraceError>
    where
        F: FnMut(TraceRecord) -> ControlFlow<()>,
    {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut stats = ReadStats::default();
        let mut offset = 0u64;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            let line_offset = offset;
            offset += read as u64;
            let complete = buf.ends_with(b"\n");

            let parsed = match std::str::from_utf8(&buf) {
                Ok(text) if text.trim().is_empty() => continue,
                Ok(text) => parse_line(text.trim(), &self.file, line_offset, self.granularity),
                Err(e) => Err(format!("invalid UTF-8: {e}")),
            };

            match parsed {
                Ok(record) => {
                    stats.records += 1;
                    if callback(record).is_break() {
                        stats.stopped = true;
                        break;
                    }
                }
                Err(_) if !complete => {
                    return Err(TraceError::ReaderEof {
                        path: self.path.clone(),
                        offset: line_offset,
                    });
                }
                Err(message) if self.skip_malformed => {
                    log::warn!(
                        "Skipping malformed record in {} at byte {line_offset}: {message}",
                        self.path.display()
                    );
                    stats.skipped += 1;
                }
                Err(message) => {
                    return Err(TraceError::MalformedRecord {
                        path: self.path.clone(),
                        offset: line_offset,
                        message,
                    });
                }
            }
        }

        log::debug!(
            "Read {} records from {} ({} skipped)",
            stats.records,
            self.path.display(),
            stats.skipped
        );
        Ok(stats)
    }
}
