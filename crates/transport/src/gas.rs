use std::{fmt, str::FromStr};

use thiserror::Error;
use uom::si::{
    f64::{Pressure, ThermodynamicTemperature},
    pressure::{self, pascal},
    thermodynamic_temperature::{self, degree_celsius},
};

use crate::table::TransportTable;

/// Largest number of components a mixture may have.
pub const MAX_COMPONENTS: usize = 6;

/// Errors that can occur while configuring or initialising a gas mixture.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GasError {
    #[error("unknown gas `{0}`")]
    UnknownGas(String),

    #[error("gas mixture has no components")]
    EmptyComposition,

    #[error("gas mixture has {count} components, at most {MAX_COMPONENTS} are supported")]
    TooManyComponents { count: usize },

    #[error("{gas} appears more than once in the mixture")]
    DuplicateGas { gas: Gas },

    #[error("fraction of {gas} must be positive and finite, got {fraction}")]
    InvalidFraction { gas: Gas, fraction: f64 },

    #[error("temperature must be above absolute zero, got {kelvin} K")]
    InvalidTemperature { kelvin: f64 },

    #[error("pressure must be positive, got {torr} Torr")]
    InvalidPressure { torr: f64 },

    #[error("maximum electron energy must be positive, got {energy} eV")]
    InvalidMaxEnergy { energy: f64 },

    #[error("electron drift is not enabled for this medium")]
    DriftDisabled,

    #[error("failed to tabulate transport coefficients: {0}")]
    Table(String),
}

/// A gas that can be part of a mixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gas {
    Argon,
    CarbonDioxide,
    Helium,
    Hydrogen,
    Isobutane,
    Methane,
    Neon,
    Nitrogen,
    Oxygen,
}

/// Per-gas parameters of the simplified transport model.
///
/// `townsend_a` and `townsend_b` parametrize the first Townsend coefficient as
/// `α/p = A·exp(−B·p/E)`. Mobility and diffusion are quoted at 760 Torr and
/// 293.15 K.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GasProperties {
    /// cm⁻¹ Torr⁻¹
    pub(crate) townsend_a: f64,
    /// V cm⁻¹ Torr⁻¹
    pub(crate) townsend_b: f64,
    /// cm⁻¹ Torr⁻¹
    pub(crate) attachment: f64,
    /// Effective collision cross section in cm².
    pub(crate) cross_section: f64,
    /// Electron mobility in cm² V⁻¹ ns⁻¹.
    pub(crate) mobility: f64,
    /// Transverse diffusion in √cm.
    pub(crate) diffusion: f64,
    /// Mean energy gained per unit reduced field, in eV per (V cm⁻¹ Torr⁻¹).
    pub(crate) energy_gain: f64,
}

impl Gas {
    /// Short chemical name.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Argon => "ar",
            Self::CarbonDioxide => "co2",
            Self::Helium => "he",
            Self::Hydrogen => "h2",
            Self::Isobutane => "ic4h10",
            Self::Methane => "ch4",
            Self::Neon => "ne",
            Self::Nitrogen => "n2",
            Self::Oxygen => "o2",
        }
    }

    pub(crate) fn properties(self) -> GasProperties {
        let (townsend_a, townsend_b, attachment, cross_section, mobility, diffusion, energy_gain) =
            match self {
                Self::Argon => (14.0, 180.0, 0.0, 1.5e-15, 3.0e-6, 0.030, 0.15),
                Self::CarbonDioxide => (20.0, 466.0, 0.0, 2.0e-15, 0.8e-6, 0.010, 0.03),
                Self::Helium => (3.0, 34.0, 0.0, 0.6e-15, 8.0e-6, 0.035, 0.20),
                Self::Hydrogen => (5.0, 130.0, 0.0, 1.0e-15, 4.0e-6, 0.025, 0.08),
                Self::Isobutane => (30.0, 500.0, 0.0, 3.0e-15, 0.6e-6, 0.012, 0.03),
                Self::Methane => (17.0, 300.0, 0.0, 1.5e-15, 10.0e-6, 0.020, 0.05),
                Self::Neon => (4.0, 100.0, 0.0, 0.3e-15, 6.0e-6, 0.035, 0.18),
                Self::Nitrogen => (12.0, 342.0, 0.0, 1.0e-15, 2.5e-6, 0.020, 0.06),
                Self::Oxygen => (15.0, 365.0, 0.05, 1.0e-15, 2.0e-6, 0.020, 0.06),
            };

        GasProperties {
            townsend_a,
            townsend_b,
            attachment,
            cross_section,
            mobility,
            diffusion,
            energy_gain,
        }
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Gas {
    type Err = GasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ar" | "argon" => Ok(Self::Argon),
            "co2" | "carbon-dioxide" => Ok(Self::CarbonDioxide),
            "he" | "helium" => Ok(Self::Helium),
            "h2" | "hydrogen" => Ok(Self::Hydrogen),
            "ic4h10" | "isobutane" | "iso-c4h10" => Ok(Self::Isobutane),
            "ch4" | "methane" => Ok(Self::Methane),
            "ne" | "neon" => Ok(Self::Neon),
            "n2" | "nitrogen" => Ok(Self::Nitrogen),
            "o2" | "oxygen" => Ok(Self::Oxygen),
            _ => Err(GasError::UnknownGas(s.to_string())),
        }
    }
}

/// A gas mixture at a given temperature and pressure.
///
/// Fractions are relative and need not sum to 100; they are normalized when
/// the mixture is initialised.
///
/// # Example
///
/// ```
/// use avalanche_transport::{Gas, GasMixture};
/// use uom::si::{f64::{Pressure, ThermodynamicTemperature}, pressure::kilopascal,
///     thermodynamic_temperature::degree_celsius};
///
/// let table = GasMixture::new([(Gas::Argon, 93.0), (Gas::CarbonDioxide, 7.0)])
///     .with_temperature(ThermodynamicTemperature::new::<degree_celsius>(20.0))
///     .with_pressure(Pressure::new::<kilopascal>(100.0))
///     .with_max_electron_energy(200.0)
///     .enable_drift()
///     .initialise()
///     .unwrap();
///
/// assert!(table.mean_free_path() > 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GasMixture {
    components: Vec<(Gas, f64)>,
    temperature: ThermodynamicTemperature,
    pressure: Pressure,
    max_electron_energy: f64,
    drift_enabled: bool,
}

impl GasMixture {
    /// Creates a mixture at 20 °C and 760 Torr with a 40 eV energy ceiling.
    pub fn new(composition: impl IntoIterator<Item = (Gas, f64)>) -> Self {
        Self {
            components: composition.into_iter().collect(),
            temperature: ThermodynamicTemperature::new::<degree_celsius>(20.0),
            pressure: Pressure::new::<pressure::torr>(760.0),
            max_electron_energy: 40.0,
            drift_enabled: false,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: ThermodynamicTemperature) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_pressure(mut self, pressure: Pressure) -> Self {
        self.pressure = pressure;
        self
    }

    /// Sets the highest electron energy (eV) the transport tables cover.
    #[must_use]
    pub fn with_max_electron_energy(mut self, energy: f64) -> Self {
        self.max_electron_energy = energy;
        self
    }

    /// Allows electrons to drift in this medium.
    #[must_use]
    pub fn enable_drift(mut self) -> Self {
        self.drift_enabled = true;
        self
    }

    #[must_use]
    pub fn temperature(&self) -> ThermodynamicTemperature {
        self.temperature
    }

    #[must_use]
    pub fn pressure(&self) -> Pressure {
        self.pressure
    }

    /// Returns the components with fractions normalized to sum to one.
    ///
    /// # Errors
    ///
    /// Returns a [`GasError`] if the composition is empty, too large, repeats
    /// a gas, or has a non-positive fraction.
    pub fn fractions(&self) -> Result<Vec<(Gas, f64)>, GasError> {
        if self.components.is_empty() {
            return Err(GasError::EmptyComposition);
        }
        if self.components.len() > MAX_COMPONENTS {
            return Err(GasError::TooManyComponents {
                count: self.components.len(),
            });
        }

        for (index, &(gas, fraction)) in self.components.iter().enumerate() {
            if !(fraction.is_finite() && fraction > 0.0) {
                return Err(GasError::InvalidFraction { gas, fraction });
            }
            if self.components[..index].iter().any(|(g, _)| *g == gas) {
                return Err(GasError::DuplicateGas { gas });
            }
        }

        let total: f64 = self.components.iter().map(|(_, f)| f).sum();
        Ok(self
            .components
            .iter()
            .map(|&(gas, fraction)| (gas, fraction / total))
            .collect())
    }

    /// Validates the mixture and builds its transport coefficient tables.
    ///
    /// No electron can be simulated without these tables, so callers should
    /// treat a failure here as fatal.
    ///
    /// # Errors
    ///
    /// Returns a [`GasError`] if the composition, temperature, pressure, or
    /// energy ceiling is invalid, drift is not enabled, or tabulation fails.
    pub fn initialise(&self) -> Result<TransportTable, GasError> {
        let fractions = self.fractions()?;

        let kelvin = self.temperature.get::<thermodynamic_temperature::kelvin>();
        if !(kelvin.is_finite() && kelvin > 0.0) {
            return Err(GasError::InvalidTemperature { kelvin });
        }

        let pressure_torr = self.pressure.get::<pressure::torr>();
        if !(pressure_torr.is_finite() && pressure_torr > 0.0) {
            return Err(GasError::InvalidPressure {
                torr: pressure_torr,
            });
        }

        if !(self.max_electron_energy.is_finite() && self.max_electron_energy > 0.0) {
            return Err(GasError::InvalidMaxEnergy {
                energy: self.max_electron_energy,
            });
        }

        if !self.drift_enabled {
            return Err(GasError::DriftDisabled);
        }

        let table = TransportTable::tabulate(
            &fractions,
            kelvin,
            self.pressure.get::<pascal>(),
            pressure_torr,
            self.max_electron_energy,
        )
        .map_err(|err| GasError::Table(err.to_string()))?;

        log::debug!(
            "initialised {} at {kelvin:.2} K and {pressure_torr:.2} Torr, mean free path {:.3e} cm",
            self,
            table.mean_free_path()
        );

        Ok(table)
    }
}

impl fmt::Display for GasMixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (gas, fraction)) in self.components.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            write!(f, "{gas} {fraction}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::pressure::kilopascal;

    fn ar_co2() -> GasMixture {
        GasMixture::new([(Gas::Argon, 93.0), (Gas::CarbonDioxide, 7.0)])
            .with_temperature(ThermodynamicTemperature::new::<degree_celsius>(20.0))
            .with_pressure(Pressure::new::<kilopascal>(100.0))
            .with_max_electron_energy(200.0)
            .enable_drift()
    }

    #[test]
    fn parses_gas_names() {
        assert_eq!("ar".parse::<Gas>().unwrap(), Gas::Argon);
        assert_eq!("CO2".parse::<Gas>().unwrap(), Gas::CarbonDioxide);
        assert_eq!("isobutane".parse::<Gas>().unwrap(), Gas::Isobutane);
        assert_eq!(
            "xenon".parse::<Gas>(),
            Err(GasError::UnknownGas("xenon".into()))
        );
    }

    #[test]
    fn fractions_are_normalized() {
        let fractions = ar_co2().fractions().unwrap();

        assert_eq!(fractions[0].0, Gas::Argon);
        assert_relative_eq!(fractions[0].1, 0.93);
        assert_relative_eq!(fractions[1].1, 0.07);
    }

    #[test]
    fn kilopascal_converts_to_torr() {
        let torr_value = ar_co2().pressure().get::<pressure::torr>();
        assert_relative_eq!(torr_value, 100.0 * 7.50062, max_relative = 1e-5);
    }

    #[test]
    fn initialise_builds_tables() {
        let table = ar_co2().initialise().unwrap();
        assert!(table.mean_free_path() > 0.0);
        assert_relative_eq!(table.max_electron_energy(), 200.0);
    }

    #[test]
    fn rejects_invalid_compositions() {
        assert_eq!(
            GasMixture::new(Vec::new()).enable_drift().initialise().unwrap_err(),
            GasError::EmptyComposition
        );
        assert_eq!(
            GasMixture::new([(Gas::Argon, 0.0)])
                .enable_drift()
                .initialise()
                .unwrap_err(),
            GasError::InvalidFraction {
                gas: Gas::Argon,
                fraction: 0.0
            }
        );
        assert_eq!(
            GasMixture::new([(Gas::Argon, 50.0), (Gas::Argon, 50.0)])
                .enable_drift()
                .initialise()
                .unwrap_err(),
            GasError::DuplicateGas { gas: Gas::Argon }
        );

        let seven = [
            Gas::Argon,
            Gas::CarbonDioxide,
            Gas::Helium,
            Gas::Hydrogen,
            Gas::Methane,
            Gas::Neon,
            Gas::Nitrogen,
        ]
        .map(|gas| (gas, 1.0));
        assert_eq!(
            GasMixture::new(seven).enable_drift().initialise().unwrap_err(),
            GasError::TooManyComponents { count: 7 }
        );
    }

    #[test]
    fn rejects_invalid_conditions() {
        let err = ar_co2()
            .with_pressure(Pressure::new::<kilopascal>(0.0))
            .initialise()
            .unwrap_err();
        assert_eq!(err, GasError::InvalidPressure { torr: 0.0 });
        assert_eq!(err.to_string(), "pressure must be positive, got 0 Torr");

        let absolute_zero =
            ThermodynamicTemperature::new::<thermodynamic_temperature::kelvin>(0.0);
        let err = ar_co2()
            .with_temperature(absolute_zero)
            .initialise()
            .unwrap_err();
        assert_eq!(err, GasError::InvalidTemperature { kelvin: 0.0 });
        assert_eq!(
            err.to_string(),
            "temperature must be above absolute zero, got 0 K"
        );

        let err = ar_co2()
            .with_max_electron_energy(-1.0)
            .initialise()
            .unwrap_err();
        assert!(matches!(err, GasError::InvalidMaxEnergy { .. }));
    }

    #[test]
    fn drift_must_be_enabled() {
        let gas = GasMixture::new([(Gas::Argon, 100.0)]);
        assert_eq!(gas.initialise().unwrap_err(), GasError::DriftDisabled);
    }

    #[test]
    fn display_lists_components() {
        assert_eq!(ar_co2().to_string(), "ar 93/co2 7");
    }
}
