use avalanche_core::BoundingBox;
use thiserror::Error;

use crate::{ElectricField, FieldSample, TransportTable, table::Coefficients};

/// Errors that can occur while configuring a [`Sensor`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    #[error("time window bin width must be positive and finite, got {0} ns")]
    InvalidBinWidth(f64),

    #[error("time window must have at least one bin")]
    NoBins,

    #[error("time window start must be finite, got {0} ns")]
    InvalidStart(f64),

    #[error("readout electrode label must not be empty")]
    EmptyReadout,
}

/// Binned time range over which signals are recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: f64,
    bin_width: f64,
    bins: usize,
}

impl TimeWindow {
    /// Creates a window starting at `start` with `bins` bins of `bin_width`,
    /// all in ns.
    ///
    /// # Errors
    ///
    /// Returns a [`SensorError`] if the start is not finite, the bin width is
    /// not positive, or there are no bins.
    pub fn new(start: f64, bin_width: f64, bins: usize) -> Result<Self, SensorError> {
        if !start.is_finite() {
            return Err(SensorError::InvalidStart(start));
        }
        if !(bin_width.is_finite() && bin_width > 0.0) {
            return Err(SensorError::InvalidBinWidth(bin_width));
        }
        if bins == 0 {
            return Err(SensorError::NoBins);
        }
        Ok(Self {
            start,
            bin_width,
            bins,
        })
    }

    #[must_use]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[must_use]
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    #[must_use]
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Returns the end of the window in ns.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.start + self.bin_width * self.bins as f64
    }

    /// Returns the bin containing time `t`, if it falls inside the window.
    #[must_use]
    pub fn bin_of(&self, t: f64) -> Option<usize> {
        if !(t >= self.start && t < self.end()) {
            return None;
        }
        let bin = ((t - self.start) / self.bin_width).floor() as usize;
        Some(bin.min(self.bins - 1))
    }
}

/// A field bound to the gas that fills it.
#[derive(Debug)]
pub struct DriftVolume<F> {
    field: F,
    medium: TransportTable,
}

impl<F: ElectricField> DriftVolume<F> {
    pub fn new(field: F, medium: TransportTable) -> Self {
        Self { field, medium }
    }

    #[must_use]
    pub fn medium(&self) -> &TransportTable {
        &self.medium
    }
}

/// The field and transport coefficients at a point inside the medium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediumSample {
    pub field: FieldSample,
    pub coefficients: Coefficients,
}

/// The active volume in which avalanches are simulated.
///
/// A sensor restricts a [`DriftVolume`] to the simulation area and designates
/// the readout electrode and its signal time window.
#[derive(Debug)]
pub struct Sensor<F> {
    volume: DriftVolume<F>,
    area: BoundingBox,
    readout: String,
    time_window: TimeWindow,
}

impl<F: ElectricField> Sensor<F> {
    /// Creates a sensor over `area` reading out the electrode labeled `readout`.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::EmptyReadout`] if the label is empty.
    pub fn new(
        volume: DriftVolume<F>,
        area: BoundingBox,
        readout: impl Into<String>,
        time_window: TimeWindow,
    ) -> Result<Self, SensorError> {
        let readout = readout.into();
        if readout.trim().is_empty() {
            return Err(SensorError::EmptyReadout);
        }
        Ok(Self {
            volume,
            area,
            readout,
            time_window,
        })
    }

    #[must_use]
    pub fn area(&self) -> &BoundingBox {
        &self.area
    }

    #[must_use]
    pub fn readout(&self) -> &str {
        &self.readout
    }

    #[must_use]
    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    #[must_use]
    pub fn medium(&self) -> &TransportTable {
        self.volume.medium()
    }

    /// Returns whether `position` lies inside the simulation area.
    #[must_use]
    pub fn in_area(&self, position: [f64; 3]) -> bool {
        self.area.contains(position)
    }

    /// Returns the field and transport coefficients at `position`.
    ///
    /// Returns `None` where there is no drift medium.
    #[must_use]
    pub fn sample(&self, position: [f64; 3]) -> Option<MediumSample> {
        let field = self.volume.field.sample(position)?;
        let coefficients = self.volume.medium.coefficients(field.magnitude()).ok()?;
        Some(MediumSample {
            field,
            coefficients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::{Gas, GasMixture, UniformField};

    fn sensor(field: UniformField) -> Sensor<UniformField> {
        let medium = GasMixture::new([(Gas::Argon, 90.0), (Gas::CarbonDioxide, 10.0)])
            .enable_drift()
            .initialise()
            .unwrap();
        Sensor::new(
            DriftVolume::new(field, medium),
            BoundingBox {
                min: [-1.0, -1.0, 0.0],
                max: [1.0, 1.0, 0.1],
            },
            "readout",
            TimeWindow::new(-2.0, 0.1, 80).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn time_window_bins_times() {
        let window = TimeWindow::new(-2.0, 0.1, 80).unwrap();

        assert_relative_eq!(window.end(), 6.0);
        assert_eq!(window.bin_of(-2.0), Some(0));
        assert_eq!(window.bin_of(-1.95), Some(0));
        assert_eq!(window.bin_of(0.05), Some(20));
        assert_eq!(window.bin_of(5.99), Some(79));
        assert_eq!(window.bin_of(6.0), None);
        assert_eq!(window.bin_of(-2.5), None);
    }

    #[test]
    fn time_window_rejects_invalid_settings() {
        assert_eq!(
            TimeWindow::new(0.0, 0.0, 10),
            Err(SensorError::InvalidBinWidth(0.0))
        );
        assert_eq!(TimeWindow::new(0.0, 0.1, 0), Err(SensorError::NoBins));
        assert!(matches!(
            TimeWindow::new(f64::NAN, 0.1, 10),
            Err(SensorError::InvalidStart(_))
        ));
    }

    #[test]
    fn samples_field_and_coefficients() {
        let sensor = sensor(UniformField {
            field: [0.0, 0.0, 40e3],
        });

        let sample = sensor.sample([0.0, 0.0, 0.05]).unwrap();
        assert_relative_eq!(sample.field.magnitude(), 40e3);
        assert!(sample.coefficients.townsend > 0.0);
        assert!(sensor.in_area([0.0, 0.0, 0.05]));
        assert!(!sensor.in_area([0.0, 0.0, -0.05]));
        assert_eq!(sensor.readout(), "readout");
    }

    #[test]
    fn rejects_empty_readout() {
        let medium = GasMixture::new([(Gas::Argon, 100.0)])
            .enable_drift()
            .initialise()
            .unwrap();
        let result = Sensor::new(
            DriftVolume::new(UniformField { field: [0.0; 3] }, medium),
            BoundingBox {
                min: [0.0; 3],
                max: [1.0; 3],
            },
            " ",
            TimeWindow::new(0.0, 1.0, 1).unwrap(),
        );
        assert!(matches!(result, Err(SensorError::EmptyReadout)));
    }
}
