//! Capability traits for run observers.
//!
//! These traits abstract over the run's event and action types, so observers
//! can be tested with lightweight stand-ins.
//!
//! # Event traits
//!
//! - [`HasProgress`]: events that report how far the run has come
//! - [`HasRecord`]: events that mark a written record
//!
//! # Action traits
//!
//! - [`CanStopEarly`]: actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use avalanche_core::Observer;
//! use avalanche_observers::traits::{CanStopEarly, HasProgress};
//!
//! struct StopAtHalf;
//!
//! impl<E: HasProgress, A: CanStopEarly> Observer<E, A> for StopAtHalf {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.event_progress() >= 0.5).then(A::stop_early)
//!     }
//! }
//! ```

use avalanche_pipeline::run;

/// An event that reports run progress.
pub trait HasProgress {
    /// Returns the fraction of events completed, in `[0, 1]`.
    fn event_progress(&self) -> f64;

    /// Returns the fraction of the current event's electrons simulated, if
    /// the event concerns a single electron.
    fn electron_progress(&self) -> Option<f64>;
}

/// An event that may mark a written record.
pub trait HasRecord {
    /// Returns the index of the event whose record was written, if any.
    fn record(&self) -> Option<usize>;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the run early.
    fn stop_early() -> Self;
}

impl HasProgress for run::Event {
    fn event_progress(&self) -> f64 {
        run::Event::event_progress(self)
    }

    fn electron_progress(&self) -> Option<f64> {
        run::Event::electron_progress(self)
    }
}

impl HasRecord for run::Event {
    fn record(&self) -> Option<usize> {
        match self {
            run::Event::Record { event, .. } => Some(*event),
            run::Event::Electron { .. } => None,
        }
    }
}

impl CanStopEarly for run::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
