use std::{collections::VecDeque, num::NonZeroUsize};

use avalanche_core::{
    Avalanche, AvalancheEndpoint, AvalancheEngine, ElectronKey, ElectronState, InitialState,
    SizeLimit,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::{ElectricField, Sensor, Status};

/// Fraction of the gap to the equilibrium energy closed in one step.
const ENERGY_RELAXATION: f64 = 0.5;

/// Upper bound of the kinetic energy (eV) given to secondary electrons.
const SECONDARY_ENERGY: f64 = 2.0;

/// Settings of the microscopic transport engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of collisions folded into one transport step.
    ///
    /// One resolves every collision; larger values trade accuracy for speed.
    pub collision_steps: NonZeroUsize,
    /// Cap on the number of electrons in one avalanche.
    pub size_limit: SizeLimit,
    /// Base seed of the per-electron random streams.
    pub seed: u64,
    /// Steps after which an electron is abandoned.
    pub max_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collision_steps: NonZeroUsize::MIN,
            size_limit: SizeLimit::Unlimited,
            seed: 0,
            max_steps: 100_000,
        }
    }
}

/// An electron waiting to be transported.
struct Pending {
    state: ElectronState,
    /// Heading for the first step, if one was given.
    heading: Option<[f64; 3]>,
}

/// A stochastic microscopic avalanche engine.
///
/// Each electron is moved in steps of `collision_steps` mean free paths
/// against the local field, with transverse diffusion, until it leaves the
/// sensor area or the medium, attaches, or exceeds the step limit. Every step
/// may ionize the gas, adding a secondary electron to the avalanche as long as
/// the size limit allows it.
///
/// Every seed electron draws from its own random stream, derived from the
/// configured seed and its [`ElectronKey`], so results do not depend on the
/// order in which seeds are simulated.
#[derive(Debug)]
pub struct MicroscopicAvalanche<F> {
    sensor: Sensor<F>,
    config: EngineConfig,
}

impl<F: ElectricField> MicroscopicAvalanche<F> {
    pub fn new(sensor: Sensor<F>, config: EngineConfig) -> Self {
        Self { sensor, config }
    }

    #[must_use]
    pub fn sensor(&self) -> &Sensor<F> {
        &self.sensor
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn rng(&self, key: ElectronKey) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        rng.set_stream(key.stream());
        rng
    }

    /// Transports one electron until it stops, queuing any secondaries.
    fn transport(
        &self,
        electron: &Pending,
        rng: &mut ChaCha8Rng,
        avalanche: &mut Avalanche,
        queue: &mut VecDeque<Pending>,
    ) -> (ElectronState, Status) {
        let medium = self.sensor.medium();
        let step = self.config.collision_steps.get() as f64 * medium.mean_free_path();
        let max_energy = medium.max_electron_energy();

        let mut state = electron.state;
        let mut heading = electron.heading;

        for _ in 0..self.config.max_steps {
            if !self.sensor.in_area(state.position) {
                return (state, Status::LeftDriftArea);
            }
            let Some(sample) = self.sensor.sample(state.position) else {
                return (state, Status::LeftDriftMedium);
            };
            let Some(drift) = sample.field.drift_direction() else {
                return (state, Status::CalculationAbandoned);
            };
            let coefficients = sample.coefficients;
            if !(coefficients.drift_velocity > 0.0) {
                return (state, Status::CalculationAbandoned);
            }

            let direction = heading.take().unwrap_or(drift);
            let spread = coefficients.diffusion * step.sqrt();
            for (position, direction) in state.position.iter_mut().zip(direction) {
                let jitter: f64 = rng.sample(StandardNormal);
                *position += direction * step + spread * jitter;
            }
            state.time += step / coefficients.drift_velocity;
            state.energy = (state.energy
                + (coefficients.mean_energy - state.energy) * ENERGY_RELAXATION)
                .clamp(0.0, max_energy);

            if !self.sensor.in_area(state.position) {
                return (state, Status::LeftDriftArea);
            }
            if rng.random::<f64>() < coefficients.attachment * step {
                return (state, Status::Attached);
            }
            if rng.random::<f64>() < coefficients.townsend * step {
                if self.config.size_limit.allows_growth(avalanche.electrons) {
                    avalanche.electrons += 1;
                    avalanche.ions += 1;
                    queue.push_back(Pending {
                        state: ElectronState {
                            energy: rng.random_range(0.0..SECONDARY_ENERGY),
                            ..state
                        },
                        heading: None,
                    });
                } else {
                    avalanche.truncated = true;
                }
            }
        }

        (state, Status::TooManyIterations)
    }
}

impl<F: ElectricField> AvalancheEngine for MicroscopicAvalanche<F> {
    fn avalanche(&self, key: ElectronKey, initial: &InitialState) -> Avalanche {
        let mut rng = self.rng(key);
        let mut queue = VecDeque::from([Pending {
            state: initial.state,
            heading: unit(initial.direction),
        }]);
        let mut avalanche = Avalanche {
            electrons: 1,
            ..Avalanche::default()
        };

        while let Some(electron) = queue.pop_front() {
            let (end, status) = self.transport(&electron, &mut rng, &mut avalanche, &mut queue);
            avalanche.endpoints.push(AvalancheEndpoint {
                start: electron.state,
                end,
                status: status.code(),
            });
        }

        if avalanche.truncated {
            log::debug!(
                "avalanche of event {} electron {} stopped at {} electrons",
                key.event,
                key.electron,
                avalanche.electrons
            );
        }

        avalanche
    }
}

/// Normalizes `direction`, returning `None` for a zero vector.
fn unit(direction: [f64; 3]) -> Option<[f64; 3]> {
    let norm = direction.iter().map(|d| d * d).sum::<f64>().sqrt();
    (norm > 0.0 && norm.is_finite()).then(|| direction.map(|d| d / norm))
}
