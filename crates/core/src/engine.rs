use crate::{AvalancheEndpoint, ElectronKey, InitialState};

/// The result of simulating the avalanche started by one seed electron.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Avalanche {
    /// Total number of electrons produced, including the seed.
    pub electrons: usize,
    /// Total number of ions produced.
    pub ions: usize,
    /// Endpoints in the order the engine produced them.
    pub endpoints: Vec<AvalancheEndpoint>,
    /// Whether multiplication stopped because the size limit was reached.
    pub truncated: bool,
}

/// The capability to simulate an avalanche from a single seed electron.
///
/// Implementations wrap a microscopic transport model. The run loop only ever
/// asks for one avalanche at a time and never mutates the engine, so an engine
/// may be shared across worker threads.
///
/// Engines are total: every call returns, possibly with zero endpoints for an
/// electron that is absorbed immediately. Reaching a configured size limit is a
/// normal outcome reported through [`Avalanche::truncated`].
///
/// Closures with the matching signature implement `AvalancheEngine`, which is
/// convenient for substituting a scripted model in tests.
///
/// # Example
///
/// ```
/// use avalanche_core::{Avalanche, AvalancheEngine, ElectronKey, InitialState};
///
/// let quenched = |_key: ElectronKey, _initial: &InitialState| Avalanche {
///     electrons: 1,
///     ..Avalanche::default()
/// };
///
/// let initial = InitialState {
///     state: Default::default(),
///     direction: avalanche_core::DOWNWARD,
/// };
/// assert!(quenched.avalanche(ElectronKey::new(0, 0), &initial).endpoints.is_empty());
/// ```
pub trait AvalancheEngine {
    /// Simulates the avalanche started by `initial`.
    ///
    /// The `key` identifies the seed electron within the run.
    fn avalanche(&self, key: ElectronKey, initial: &InitialState) -> Avalanche;
}

/// Blanket implementation for engine closures.
impl<F> AvalancheEngine for F
where
    F: Fn(ElectronKey, &InitialState) -> Avalanche,
{
    fn avalanche(&self, key: ElectronKey, initial: &InitialState) -> Avalanche {
        self(key, initial)
    }
}
