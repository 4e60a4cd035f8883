/// An electron entering the amplification region.
///
/// Seeds come from a prior drift stage and are immutable once read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedElectron {
    /// Position `[x, y, z]` in cm.
    pub position: [f64; 3],
    /// Kinetic energy in eV.
    pub energy: f64,
    /// Time offset in ns.
    pub time: f64,
}

/// Kinematic state of an electron at one point of its trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElectronState {
    /// Position `[x, y, z]` in cm.
    pub position: [f64; 3],
    /// Time in ns.
    pub time: f64,
    /// Kinetic energy in eV.
    pub energy: f64,
}

/// The inputs an engine needs to start an avalanche from one electron.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialState {
    /// Starting position, time, and energy.
    pub state: ElectronState,
    /// Initial direction of motion.
    ///
    /// A zero vector lets the engine follow the local field.
    pub direction: [f64; 3],
}

/// One electron's trajectory segment produced by an avalanche run.
///
/// The `status` code classifies how the electron stopped. Its meaning is
/// defined by the engine and is passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvalancheEndpoint {
    pub start: ElectronState,
    pub end: ElectronState,
    pub status: i32,
}

/// Identifies a seed electron within a run.
///
/// Engines that sample randomly derive their per-electron stream from this key,
/// which keeps results independent of the order electrons are simulated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElectronKey {
    /// Zero-based index of the event in the input dataset.
    pub event: usize,
    /// Zero-based index of the electron within its event.
    pub electron: usize,
}

impl ElectronKey {
    #[must_use]
    pub fn new(event: usize, electron: usize) -> Self {
        Self { event, electron }
    }

    /// Packs the key into a single stream identifier.
    ///
    /// The event index occupies the upper 32 bits and the electron index the
    /// lower 32 bits.
    #[must_use]
    pub fn stream(&self) -> u64 {
        ((self.event as u64) << 32) | (self.electron as u64 & 0xFFFF_FFFF)
    }
}
