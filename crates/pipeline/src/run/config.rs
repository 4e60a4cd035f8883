use avalanche_core::StartHeight;

use crate::CancelToken;

/// How seed electrons within an event are simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// One seed electron at a time, in input order.
    #[default]
    Sequential,
    /// All seed electrons of an event at once on the rayon thread pool.
    ///
    /// Endpoints are still recorded in seed order, so the output matches
    /// sequential execution for engines whose results depend only on the
    /// electron key and initial state.
    Parallel,
}

/// Configuration for a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Top of the amplification region in cm.
    pub amplification_start: f64,

    /// Height policy for the initial state of each seed electron.
    pub start_height: StartHeight,

    pub execution: Execution,

    /// Token checked before each seed electron.
    pub cancel: Option<CancelToken>,
}

impl Config {
    /// Creates a sequential configuration starting avalanches at
    /// `amplification_start`.
    #[must_use]
    pub fn new(amplification_start: f64) -> Self {
        Self {
            amplification_start,
            start_height: StartHeight::default(),
            execution: Execution::default(),
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_start_height(self, start_height: StartHeight) -> Self {
        Self {
            start_height,
            ..self
        }
    }

    #[must_use]
    pub fn with_execution(self, execution: Execution) -> Self {
        Self { execution, ..self }
    }

    #[must_use]
    pub fn with_cancel(self, cancel: CancelToken) -> Self {
        Self {
            cancel: Some(cancel),
            ..self
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}
