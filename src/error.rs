//! Error types for trace loading.
//!
//! - **`TraceError`** - typed domain errors raised by the reader, the loader
//!   state machine and configuration loading. Convert with `.into()` to
//!   `anyhow::Error` at the CLI boundary; `downcast_ref` recovers the variant.
//!
//! - **`Inconsistency`** - problems found in otherwise valid input (conflicting
//!   parents, self transfers). These are collected, logged and reported, never
//!   raised.

use std::path::PathBuf;

use crate::trace::ActivityId;

/// Domain errors for reading and loading trace files.
///
/// # Usage
///
/// ```ignore
/// return Err(TraceError::InvalidFile { path, reason: "is a directory".into() }.into());
///
/// if let Some(TraceError::ReaderEof { offset, .. }) = err.downcast_ref() {
///     println!("file truncated at {offset}");
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    // -------------------------------------------------------------------------
    // Reader errors
    // -------------------------------------------------------------------------
    /// File cannot be used as a trace source
    #[error("invalid trace file {}: {reason}", path.display())]
    InvalidFile { path: PathBuf, reason: String },

    /// File ended in the middle of a record
    #[error("unexpected end of {} at byte {offset}", path.display())]
    ReaderEof { path: PathBuf, offset: u64 },

    /// A line could not be parsed as a trace record
    #[error("malformed record in {} at byte {offset}: {message}", path.display())]
    MalformedRecord {
        path: PathBuf,
        offset: u64,
        message: String,
    },

    // -------------------------------------------------------------------------
    // Loader errors
    // -------------------------------------------------------------------------
    /// The load state machine rejected an event
    #[error("cannot apply {event} while {from}")]
    InvalidTransition { from: String, event: String },

    /// Configuration file could not be read or parsed
    #[error("{message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A recoverable problem in the transfer graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// A transfer tried to give `child` a second parent; `kept` stays.
    ParentConflict {
        child: ActivityId,
        kept: ActivityId,
        rejected: ActivityId,
    },
    /// A transfer record names its own activity as the target.
    SelfTransfer { activity: ActivityId },
}

impl std::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParentConflict {
                child,
                kept,
                rejected,
            } => write!(
                f,
                "activity {child} already has parent {kept}; ignoring transfer from {rejected}"
            ),
            Self::SelfTransfer { activity } => {
                write!(f, "activity {activity} transfers to itself")
            }
        }
    }
}
