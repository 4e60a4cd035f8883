/// Indicates how the run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every input event was written.
    Complete,

    /// Stopped early due to an observer action.
    StoppedByObserver,

    /// Stopped because the run's cancel token was triggered.
    Cancelled,
}

/// Summary of a run.
///
/// Counters cover written events only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    /// How the run terminated.
    pub status: Status,

    /// Records written, one per input event.
    pub events: usize,

    /// Seed electrons simulated.
    pub seeds: usize,

    /// Electrons produced by all avalanches, seeds included.
    pub avalanche_electrons: usize,

    /// Endpoints written across all records.
    pub endpoints: usize,

    /// Avalanches cut short by the size limit.
    pub truncated_avalanches: usize,
}

impl Solution {
    pub(crate) fn empty() -> Self {
        Self {
            status: Status::Complete,
            events: 0,
            seeds: 0,
            avalanche_electrons: 0,
            endpoints: 0,
            truncated_avalanches: 0,
        }
    }

    pub(crate) fn stopped(self, status: Status) -> Self {
        Self { status, ..self }
    }
}
