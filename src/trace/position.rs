//! Record positions and the cross-file total order.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Identity of one trace file.
///
/// `identity_hash` is derived from the path text only, so the same path gives
/// the same value in every run.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    identity_hash: u64,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Arc<Self> {
        let path = path.into();
        let digest = Sha256::digest(path.to_string_lossy().as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Arc::new(Self {
            path,
            identity_hash: u64::from_be_bytes(head),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn identity_hash(&self) -> u64 {
        self.identity_hash
    }
}

impl PartialEq for SourceFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for SourceFile {}

/// Where a record came from and when it happened.
#[derive(Debug, Clone)]
pub struct TraceRecordPosition {
    pub file: Arc<SourceFile>,
    pub offset: u64,
    pub time: DateTime<Utc>,
    pub type_priority: i32,
}

impl TraceRecordPosition {
    pub fn new(
        file: Arc<SourceFile>,
        offset: u64,
        time: DateTime<Utc>,
        type_priority: i32,
    ) -> Self {
        Self {
            file,
            offset,
            time,
            type_priority,
        }
    }
}

/// Total order over positions from any number of files.
///
/// Time ascending, then type priority descending, then byte offset within a
/// file. Records from different files that still tie are ordered by the file
/// identity hash (path text on a hash collision). That last step only makes
/// the order deterministic; it carries no meaning.
pub fn compare_positions(a: &TraceRecordPosition, b: &TraceRecordPosition) -> Ordering {
    a.time
        .cmp(&b.time)
        .then_with(|| b.type_priority.cmp(&a.type_priority))
        .then_with(|| {
            if a.file == b.file {
                a.offset.cmp(&b.offset)
            } else {
                a.file
                    .identity_hash
                    .cmp(&b.file.identity_hash)
                    .then_with(|| a.file.path.cmp(&b.file.path))
                    .then_with(|| a.offset.cmp(&b.offset))
            }
        })
}

impl PartialEq for TraceRecordPosition {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TraceRecordPosition {}

impl PartialOrd for TraceRecordPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TraceRecordPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_positions(self, other)
    }
}
