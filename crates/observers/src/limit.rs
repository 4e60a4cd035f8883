use std::num::NonZeroUsize;

use avalanche_core::Observer;

use crate::traits::{CanStopEarly, HasRecord};

/// Stops a run once a number of records have been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventLimit {
    max: NonZeroUsize,
    written: usize,
}

impl EventLimit {
    #[must_use]
    pub fn new(max: NonZeroUsize) -> Self {
        Self { max, written: 0 }
    }

    /// Returns the number of records seen so far.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }
}

impl<E: HasRecord, A: CanStopEarly> Observer<E, A> for EventLimit {
    fn observe(&mut self, event: &E) -> Option<A> {
        event.record()?;
        self.written += 1;
        if self.written >= self.max.get() {
            log::info!("stopping after {} events", self.written);
            return Some(A::stop_early());
        }
        None
    }
}
