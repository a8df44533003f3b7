//! Load workflow state machine.

use crate::error::TraceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LoadEvent {
    Start,
    Finish,
    Cancel,
    Fail,
    Reset,
}

impl LoadState {
    /// Next state for `event`, or [`TraceError::InvalidTransition`].
    ///
    /// | from                         | event  | to        |
    /// |------------------------------|--------|-----------|
    /// | idle                         | start  | loading   |
    /// | loading                      | finish | loaded    |
    /// | loading                      | cancel | cancelled |
    /// | loading                      | fail   | failed    |
    /// | loaded / cancelled / failed  | reset  | idle      |
    pub fn apply(self, event: LoadEvent) -> Result<Self, TraceError> {
        use LoadEvent as E;
        use LoadState::*;

        match (self, event) {
            (Idle, E::Start) => Ok(Loading),
            (Loading, E::Finish) => Ok(Loaded),
            (Loading, E::Cancel) => Ok(Cancelled),
            (Loading, E::Fail) => Ok(Failed),
            (Loaded | Cancelled | Failed, E::Reset) => Ok(Idle),
            (from, event) => Err(TraceError::InvalidTransition {
                from: from.to_string(),
                event: event.to_string(),
            }),
        }
    }

    /// A load has ended, one way or another.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Loaded | Self::Cancelled | Self::Failed)
    }
}
