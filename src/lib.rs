pub mod activity;
pub mod config;
pub mod error;
pub mod layout;
pub mod loader;
pub mod source;
pub mod trace;

// Re-export the types most callers start from
pub use error::TraceError;
pub use loader::{LoadOutcome, Loader};
pub use source::{SharedDataSource, TraceDataSource};
