use serde::{Deserialize, Serialize};

use crate::{DOWNWARD, ElectronState, InitialState, SeedElectron};

/// Policy for the height at which a seed electron's avalanche starts.
///
/// Seeds carry the z coordinate recorded by the drift stage, but the reference
/// setup discards it and starts every avalanche at the entrance of the
/// amplification region. Both behaviors are available.
///
/// In TOML the policy is written as `"amplification_start"`, `"seed"`, or
/// `{ fixed = 0.01 }`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartHeight {
    /// Start at the top of the amplification region.
    #[default]
    AmplificationStart,
    /// Start at the z coordinate recorded for the seed.
    Seed,
    /// Start at a fixed height in cm.
    Fixed(f64),
}

impl StartHeight {
    /// Builds the engine input for `seed`.
    ///
    /// The x and y coordinates, time, and energy are taken from the seed
    /// verbatim, and the direction points straight down. The z coordinate
    /// follows this policy, where `amplification_start` is the top of the
    /// amplification region in cm.
    #[must_use]
    pub fn initial_state(&self, seed: &SeedElectron, amplification_start: f64) -> InitialState {
        let [x, y, seed_z] = seed.position;
        let z = match self {
            Self::AmplificationStart => amplification_start,
            Self::Seed => seed_z,
            Self::Fixed(z) => *z,
        };

        InitialState {
            state: ElectronState {
                position: [x, y, z],
                time: seed.time,
                energy: seed.energy,
            },
            direction: DOWNWARD,
        }
    }
}
