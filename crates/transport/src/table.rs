use std::fmt;

use ndarray::Array1;

use crate::{
    gas::Gas,
    interpolation::{Curve, InterpError},
};

/// Boltzmann constant in J/K.
const BOLTZMANN: f64 = 1.380_649e-23;

/// Boltzmann constant in eV/K.
const BOLTZMANN_EV: f64 = 8.617_333e-5;

/// Drift velocity an electron swarm saturates at, in cm/ns.
const SATURATION_VELOCITY: f64 = 0.1;

/// Field strengths (V/cm) spanned by the tables, tabulated log-uniformly.
const FIELD_RANGE: (f64, f64) = (10.0, 1.0e6);
const FIELD_POINTS: usize = 240;

/// Transport coefficients of a gas mixture at one field strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// First Townsend (ionization) coefficient in 1/cm.
    pub townsend: f64,
    /// Attachment coefficient in 1/cm.
    pub attachment: f64,
    /// Drift velocity in cm/ns.
    pub drift_velocity: f64,
    /// Transverse diffusion in √cm.
    pub diffusion: f64,
    /// Mean electron energy in eV.
    pub mean_energy: f64,
}

/// Tabulated transport coefficients of an initialised gas mixture.
///
/// Built by [`GasMixture::initialise`](crate::GasMixture::initialise). The
/// coefficients follow a simplified swarm model: a Korff-style Townsend
/// coefficient, Blanc's law for the mixture mobility with velocity
/// saturation, and mean energies that grow linearly with the reduced field
/// up to the configured ceiling.
pub struct TransportTable {
    townsend: Curve,
    attachment: Curve,
    drift_velocity: Curve,
    diffusion: Curve,
    mean_energy: Curve,
    mean_free_path: f64,
    max_electron_energy: f64,
}

impl TransportTable {
    pub(crate) fn tabulate(
        fractions: &[(Gas, f64)],
        kelvin: f64,
        pascal: f64,
        torr: f64,
        max_electron_energy: f64,
    ) -> Result<Self, InterpError> {
        let mixture: Vec<_> = fractions
            .iter()
            .map(|&(gas, fraction)| (gas.properties(), fraction))
            .collect();

        let density_scale = 760.0 / torr;
        let mobility = density_scale * (kelvin / 293.15)
            / mixture.iter().map(|(p, f)| f / p.mobility).sum::<f64>();
        let diffusion =
            density_scale.sqrt() * mixture.iter().map(|(p, f)| f * p.diffusion).sum::<f64>();
        let attachment = torr * mixture.iter().map(|(p, f)| f * p.attachment).sum::<f64>();
        let thermal_energy = 1.5 * BOLTZMANN_EV * kelvin;

        let number_density = pascal / (BOLTZMANN * kelvin) * 1e-6;
        let cross_section: f64 = mixture.iter().map(|(p, f)| f * p.cross_section).sum();
        let mean_free_path = 1.0 / (number_density * cross_section);

        let (low, high) = FIELD_RANGE;
        let ratio = (high / low).powf(1.0 / (FIELD_POINTS - 1) as f64);
        let fields: Array1<f64> = std::iter::once(0.0)
            .chain((0..FIELD_POINTS).map(|i| low * ratio.powi(i as i32)))
            .collect();

        let townsend = fields.mapv(|e| {
            if e > 0.0 {
                let reduced = e / torr;
                torr * mixture
                    .iter()
                    .map(|(p, f)| f * p.townsend_a * (-p.townsend_b / reduced).exp())
                    .sum::<f64>()
            } else {
                0.0
            }
        });
        let velocity = fields.mapv(|e| mobility * e / (1.0 + mobility * e / SATURATION_VELOCITY));
        let energy = fields.mapv(|e| {
            let gain: f64 = mixture.iter().map(|(p, f)| f * p.energy_gain).sum();
            (thermal_energy + gain * e / torr).min(max_electron_energy)
        });

        Ok(Self {
            townsend: Curve::new(fields.clone(), townsend)?,
            attachment: Curve::new(fields.clone(), fields.mapv(|_| attachment))?,
            drift_velocity: Curve::new(fields.clone(), velocity)?,
            diffusion: Curve::new(fields.clone(), fields.mapv(|_| diffusion))?,
            mean_energy: Curve::new(fields, energy)?,
            mean_free_path,
            max_electron_energy,
        })
    }

    /// Returns the coefficients at field strength `field` (V/cm).
    ///
    /// Fields beyond the tabulated range use the values at the range ends.
    ///
    /// # Errors
    ///
    /// Returns an error if interpolation fails, for example for a NaN field.
    pub fn coefficients(&self, field: f64) -> Result<Coefficients, InterpError> {
        Ok(Coefficients {
            townsend: self.townsend.at(field)?,
            attachment: self.attachment.at(field)?,
            drift_velocity: self.drift_velocity.at(field)?,
            diffusion: self.diffusion.at(field)?,
            mean_energy: self.mean_energy.at(field)?,
        })
    }

    /// Mean distance between collisions in cm.
    #[must_use]
    pub fn mean_free_path(&self) -> f64 {
        self.mean_free_path
    }

    /// Highest electron energy tracked, in eV.
    #[must_use]
    pub fn max_electron_energy(&self) -> f64 {
        self.max_electron_energy
    }
}

impl fmt::Debug for TransportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportTable")
            .field("mean_free_path", &self.mean_free_path)
            .field("max_electron_energy", &self.max_electron_energy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    /// Ar/CO2 93/7 at 20 °C and 100 kPa.
    fn ar_co2() -> TransportTable {
        TransportTable::tabulate(
            &[(Gas::Argon, 0.93), (Gas::CarbonDioxide, 0.07)],
            293.15,
            100e3,
            750.062,
            200.0,
        )
        .unwrap()
    }

    #[test]
    fn ionization_grows_with_field() {
        let table = ar_co2();

        let weak = table.coefficients(1e3).unwrap();
        let strong = table.coefficients(40e3).unwrap();

        assert!(weak.townsend < 1e-3, "drift field should barely ionize");
        assert!(
            strong.townsend > 100.0,
            "amplification field should multiply"
        );
        assert!(strong.drift_velocity > weak.drift_velocity);
        assert!(strong.mean_energy > weak.mean_energy);
    }

    #[test]
    fn zero_field_is_thermal() {
        let coefficients = ar_co2().coefficients(0.0).unwrap();

        assert_relative_eq!(coefficients.townsend, 0.0);
        assert_relative_eq!(coefficients.drift_velocity, 0.0);
        assert_relative_eq!(coefficients.mean_energy, 1.5 * BOLTZMANN_EV * 293.15);
    }

    #[test]
    fn velocity_saturates_and_energy_is_capped() {
        let table = TransportTable::tabulate(&[(Gas::Argon, 1.0)], 293.15, 100e3, 750.062, 5.0)
            .unwrap();

        let coefficients = table.coefficients(1e7).unwrap();
        assert!(coefficients.drift_velocity < SATURATION_VELOCITY);
        assert_relative_eq!(coefficients.mean_energy, 5.0);
    }

    #[test]
    fn mean_free_path_matches_gas_density() {
        let table = ar_co2();

        // n = p / kT ≈ 2.47e19 cm⁻³, σ ≈ 1.535e-15 cm²
        assert_relative_eq!(table.mean_free_path(), 2.64e-5, max_relative = 0.01);
    }

    #[test]
    fn only_oxygen_attaches() {
        let clean = ar_co2().coefficients(10e3).unwrap();
        assert_relative_eq!(clean.attachment, 0.0);

        let table = TransportTable::tabulate(
            &[(Gas::Argon, 0.9), (Gas::Oxygen, 0.1)],
            293.15,
            100e3,
            750.062,
            200.0,
        )
        .unwrap();
        assert!(table.coefficients(10e3).unwrap().attachment > 0.0);
    }
}
