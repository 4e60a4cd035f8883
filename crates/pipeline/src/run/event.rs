use avalanche_core::ElectronKey;

/// Event emitted by a run as it progresses.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A seed electron's avalanche was simulated.
    Electron {
        key: ElectronKey,
        /// Seed electrons in the current event.
        seeds: usize,
        /// Events in the run.
        events: usize,
        /// Electrons in the avalanche, including the seed.
        electrons: usize,
        /// Endpoints the avalanche contributed.
        endpoints: usize,
        /// Whether the size limit cut the avalanche short.
        truncated: bool,
    },

    /// An event's record was written.
    Record {
        event: usize,
        events: usize,
        nele: i32,
        nelep: i32,
    },
}

impl Event {
    /// Fraction of the run's events completed, in `[0, 1]`.
    ///
    /// Events still being simulated count as not completed.
    #[must_use]
    pub fn event_progress(&self) -> f64 {
        match *self {
            Self::Electron { key, events, .. } => fraction(key.event, events),
            Self::Record { event, events, .. } => fraction(event + 1, events),
        }
    }

    /// Fraction of the current event's seed electrons simulated.
    ///
    /// Returns `None` for [`Event::Record`].
    #[must_use]
    pub fn electron_progress(&self) -> Option<f64> {
        match *self {
            Self::Electron { key, seeds, .. } => Some(fraction(key.electron + 1, seeds)),
            Self::Record { .. } => None,
        }
    }
}

fn fraction(done: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        done as f64 / total as f64
    }
}
