//! Trace records, their positions, and reading them from files.
//!
//! # Usage
//!
//! ```ignore
//! use e2etrace::trace::{Granularity, TraceFileReader};
//!
//! let reader = TraceFileReader::open(path, Granularity::Process)?;
//! reader.for_each(|record| {
//!     source.append_record(record);
//!     ControlFlow::Continue(())
//! })?;
//! ```

mod builder;
pub mod display;
pub mod parse;
mod position;
mod record;

pub use builder::TraceRecordBuilder;
pub use parse::{ReadStats, TraceFileReader, parse_line};
pub use position::{SourceFile, TraceRecordPosition, compare_positions};
pub use record::{
    ActivityId, ExecutionInfo, Granularity, MessageDirection, MessageInfo, TraceEventType,
    TraceId, TraceLevel, TraceRecord,
};
