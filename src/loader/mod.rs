//! Loading trace files into a [`TraceDataSource`].
//!
//! A reader thread streams records from every file through a
//! [`handoff::rendezvous`]; the calling thread collects them, sorts them into
//! the total record order and appends them to a fresh data source.

use std::path::PathBuf;
use std::thread;

use crate::config::TraceConfig;
use crate::error::TraceError;
use crate::source::TraceDataSource;
use crate::trace::{TraceFileReader, TraceRecord, compare_positions};

mod handoff;
mod state;

pub use handoff::{CancellationToken, Consumer, Producer, rendezvous};
pub use state::{LoadEvent, LoadState};

/// Counts for one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Files read to the end (or to a truncated final line).
    pub files: usize,
    pub records: usize,
    /// Malformed lines skipped.
    pub skipped: usize,
    /// The reader stopped before delivering every file.
    pub cancelled: bool,
}

#[derive(Debug)]
pub struct LoadOutcome {
    /// Everything received before the load ended. Partial when cancelled.
    pub source: TraceDataSource,
    pub stats: LoadStats,
    pub state: LoadState,
}

/// Drives the load state machine around one or more loads.
#[derive(Debug, Default)]
pub struct Loader {
    config: TraceConfig,
    state: LoadState,
}

impl Loader {
    pub fn new(config: TraceConfig) -> Self {
        Self {
            config,
            state: LoadState::Idle,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn load(&mut self, paths: &[PathBuf]) -> Result<LoadOutcome, TraceError> {
        self.load_with_token(paths, CancellationToken::new())
    }

    /// Like [`load`](Self::load), stopping early once `token` is cancelled.
    pub fn load_with_token(
        &mut self,
        paths: &[PathBuf],
        token: CancellationToken,
    ) -> Result<LoadOutcome, TraceError> {
        if self.state.is_finished() {
            self.transition(LoadEvent::Reset)?;
        }
        self.transition(LoadEvent::Start)?;

        match self.run(paths, &token) {
            Ok((records, stats)) => {
                let event = if stats.cancelled {
                    LoadEvent::Cancel
                } else {
                    LoadEvent::Finish
                };
                self.transition(event)?;
                let source = self.build_source(records);
                Ok(LoadOutcome {
                    source,
                    stats,
                    state: self.state,
                })
            }
            Err(e) => {
                self.transition(LoadEvent::Fail)?;
                Err(e)
            }
        }
    }

    fn transition(&mut self, event: LoadEvent) -> Result<(), TraceError> {
        let next = self.state.apply(event)?;
        log::debug!("Load state {} -> {next} on {event}", self.state);
        self.state = next;
        Ok(())
    }

    fn run(
        &self,
        paths: &[PathBuf],
        token: &CancellationToken,
    ) -> Result<(Vec<TraceRecord>, LoadStats), TraceError> {
        // Open every file first so a bad path fails before the reader starts.
        let readers = paths
            .iter()
            .map(|path| {
                TraceFileReader::open(path, self.config.granularity())
                    .map(|reader| reader.skip_malformed(self.config.skip_malformed))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (producer, consumer) = rendezvous(token.clone());
        let reader = thread::Builder::new()
            .name("trace-reader".to_string())
            .spawn(move || read_all(&readers, &producer))?;

        let records: Vec<TraceRecord> = consumer.collect();
        let stats = reader
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))?;
        log::debug!(
            "Received {} records from {} files",
            records.len(),
            stats.files
        );
        Ok((records, stats))
    }

    fn build_source(&self, mut records: Vec<TraceRecord>) -> TraceDataSource {
        records.sort_by(|a, b| compare_positions(&a.position, &b.position));
        let mut source = TraceDataSource::new(self.config.clone());
        for record in records {
            source.append_record(record);
        }
        for inconsistency in source.graph().inconsistencies() {
            log::debug!("Inconsistent trace: {inconsistency}");
        }
        source
    }
}

/// Reader thread body: stream each file through `producer` until done or
/// cancelled.
fn read_all(
    readers: &[TraceFileReader],
    producer: &Producer<TraceRecord>,
) -> Result<LoadStats, TraceError> {
    let mut stats = LoadStats::default();
    for reader in readers {
        if producer.is_cancelled() {
            stats.cancelled = true;
            break;
        }
        let mut delivered = 0;
        let result = reader.for_each(|record| {
            let flow = producer.offer(record);
            if flow.is_continue() {
                delivered += 1;
            }
            flow
        });
        stats.records += delivered;
        match result {
            Ok(read) => {
                stats.skipped += read.skipped;
                if read.stopped {
                    stats.cancelled = true;
                    break;
                }
                stats.files += 1;
            }
            Err(TraceError::ReaderEof { path, offset }) => {
                log::warn!("{} ends mid-record at byte {offset}", path.display());
                stats.files += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(stats)
}
