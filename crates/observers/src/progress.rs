use avalanche_core::Observer;

use crate::traits::HasProgress;

/// Logs run progress as coarse percentages.
///
/// Event progress is logged at `info` level each time it crosses the next
/// multiple of the configured step. Per-electron progress within an event is
/// logged at `debug` level. The logger never requests an action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressLogger {
    step: f64,
    next: f64,
}

impl ProgressLogger {
    /// Creates a logger reporting every `step_percent` percent of events.
    ///
    /// Steps that are not positive are treated as 1 %.
    #[must_use]
    pub fn new(step_percent: f64) -> Self {
        let step = if step_percent > 0.0 { step_percent } else { 1.0 };
        Self { step, next: step }
    }

    /// Returns the next percentage that will be reported.
    #[must_use]
    pub fn next_report(&self) -> f64 {
        self.next
    }
}

impl Default for ProgressLogger {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl<E: HasProgress, A> Observer<E, A> for ProgressLogger {
    fn observe(&mut self, event: &E) -> Option<A> {
        let events = 100.0 * event.event_progress();

        if let Some(electrons) = event.electron_progress() {
            log::debug!(
                "progress: {events:.1}% of events, {:.1}% of electrons in event",
                100.0 * electrons
            );
        }

        if events >= self.next {
            log::info!("progress: {events:.0}% of events");
            while self.next <= events {
                self.next += self.step;
            }
        }

        None
    }
}
