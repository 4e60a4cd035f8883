//! TOML run settings.
//!
//! Every key is optional. Missing keys take the values of the reference
//! Micromegas setup: a 9 × 9 cm detector filled with Ar/CO2 93/7 at 20 °C and
//! 100 kPa, and a 100 µm amplification gap.

use std::{collections::BTreeMap, fs, num::NonZeroUsize, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use avalanche_core::{AmplificationRegion, DetectorGeometry, SizeLimit, StartHeight};
use avalanche_transport::{
    EngineConfig, FieldFileFormat, Gas, GasError, GasMixture, SensorError, Strategy, TimeWindow,
    VoxelMesh,
};
use serde::{Deserialize, Serialize};
use uom::si::{
    f64::{Length, Pressure, ThermodynamicTemperature},
    length::centimeter,
    pressure::kilopascal,
    thermodynamic_temperature::degree_celsius,
};

/// Root of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub detector: DetectorSettings,
    pub amplification: AmplificationSettings,
    pub field: FieldSettings,
    pub gas: GasSettings,
    pub sensor: SensorSettings,
    pub engine: EngineSettings,
    pub run: RunSettings,
}

impl Settings {
    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid settings {}", path.display()))
    }

    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid settings.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// `[detector]`: active area and gas filling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorSettings {
    /// Width along x in cm.
    pub size_x: f64,
    /// Width along y in cm.
    pub size_y: f64,
    /// Relative fractions keyed by gas name, e.g. `{ ar = 93.0, co2 = 7.0 }`.
    pub gas_composition: BTreeMap<String, f64>,
    /// Gas temperature in °C.
    pub temperature: f64,
    /// Gas pressure in kPa.
    pub pressure: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            size_x: 9.0,
            size_y: 9.0,
            gas_composition: BTreeMap::from([("ar".to_owned(), 93.0), ("co2".to_owned(), 7.0)]),
            temperature: 20.0,
            pressure: 100.0,
        }
    }
}

impl DetectorSettings {
    #[must_use]
    pub fn geometry(&self) -> DetectorGeometry {
        DetectorGeometry {
            size_x: Length::new::<centimeter>(self.size_x),
            size_y: Length::new::<centimeter>(self.size_y),
        }
    }

    /// Builds the gas mixture at the configured temperature and pressure.
    ///
    /// # Errors
    ///
    /// Returns [`GasError::UnknownGas`] for an unrecognized gas name.
    pub fn mixture(&self) -> Result<GasMixture, GasError> {
        let composition = self
            .gas_composition
            .iter()
            .map(|(name, &fraction)| Ok((name.parse::<Gas>()?, fraction)))
            .collect::<Result<Vec<_>, GasError>>()?;

        Ok(GasMixture::new(composition)
            .with_temperature(ThermodynamicTemperature::new::<degree_celsius>(
                self.temperature,
            ))
            .with_pressure(Pressure::new::<kilopascal>(self.pressure)))
    }
}

/// `[amplification]`: the amplification gap and default file paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmplificationSettings {
    /// Largest avalanche in electrons, zero for no limit.
    pub max_avalanche_size: usize,
    /// Bottom of the simulation area in cm.
    pub z_min: f64,
    /// Top of the amplification gap in cm.
    pub z_max: f64,
    /// Extra height above `z_max` in cm.
    pub z_max_safety: f64,
    pub start_height: StartHeight,
    /// Drift records read when no paths are given.
    pub in_filename: PathBuf,
    /// Avalanche records written when no paths are given.
    pub out_filename: PathBuf,
}

impl Default for AmplificationSettings {
    fn default() -> Self {
        Self {
            max_avalanche_size: 0,
            z_min: -0.002,
            z_max: 0.01,
            z_max_safety: 0.02,
            start_height: StartHeight::AmplificationStart,
            in_filename: PathBuf::from(
                "/localscratch/simulation_files/MicroMegas-Simulation/outfiles/drift.root",
            ),
            out_filename: PathBuf::from(
                "/localscratch/simulation_files/MicroMegas-Simulation/outfiles/avalanche.root",
            ),
        }
    }
}

impl AmplificationSettings {
    #[must_use]
    pub fn region(&self) -> AmplificationRegion {
        AmplificationRegion {
            z_min: Length::new::<centimeter>(self.z_min),
            z_max: Length::new::<centimeter>(self.z_max),
            z_max_safety: Length::new::<centimeter>(self.z_max_safety),
        }
    }
}

/// `[field]`: where the electric field comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSettings {
    /// A field map on a voxel mesh.
    Voxel(VoxelSettings),
    /// The same field everywhere, in V/cm.
    Uniform { field: [f64; 3] },
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self::Voxel(VoxelSettings::default())
    }
}

/// Voxel field map settings. Lengths are in cm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelSettings {
    /// Voxels along x, y, and z.
    pub cells: [usize; 3],
    pub x: [f64; 2],
    pub y: [f64; 2],
    pub z: [f64; 2],
    pub file: PathBuf,
    pub with_potential: bool,
    pub with_region: bool,
    pub length_scale: f64,
    pub field_scale: f64,
    pub potential_scale: f64,
    pub periodic_x: bool,
    pub periodic_y: bool,
    pub interpolation: Strategy,
    /// Region index holding the drift medium, for maps with regions.
    pub drift_region: u32,
}

impl Default for VoxelSettings {
    fn default() -> Self {
        let format = FieldFileFormat::default();
        Self {
            cells: [10, 10, 40],
            x: [-64e-4, 64e-4],
            y: [-64e-4, 64e-4],
            z: [-154e-6, 300e-6],
            file: PathBuf::from("field.txt"),
            with_potential: format.with_potential,
            with_region: format.with_region,
            length_scale: format.length_scale,
            field_scale: format.field_scale,
            potential_scale: format.potential_scale,
            periodic_x: true,
            periodic_y: true,
            interpolation: Strategy::Linear,
            drift_region: 0,
        }
    }
}

impl VoxelSettings {
    #[must_use]
    pub fn mesh(&self) -> VoxelMesh {
        VoxelMesh {
            cells: self.cells,
            min: [self.x[0], self.y[0], self.z[0]],
            max: [self.x[1], self.y[1], self.z[1]],
        }
    }

    #[must_use]
    pub fn format(&self) -> FieldFileFormat {
        FieldFileFormat {
            with_potential: self.with_potential,
            with_region: self.with_region,
            length_scale: self.length_scale,
            field_scale: self.field_scale,
            potential_scale: self.potential_scale,
        }
    }
}

/// `[gas]`: transport model limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GasSettings {
    /// Highest electron energy tracked, in eV.
    pub max_electron_energy: f64,
}

impl Default for GasSettings {
    fn default() -> Self {
        Self {
            max_electron_energy: 200.0,
        }
    }
}

/// `[sensor]`: readout electrode and signal time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorSettings {
    pub readout: String,
    /// Window start in ns.
    pub start: f64,
    /// Bin width in ns.
    pub bin_width: f64,
    pub bins: usize,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            readout: "readout".to_owned(),
            start: -2.0,
            bin_width: 0.1,
            bins: 80,
        }
    }
}

impl SensorSettings {
    /// # Errors
    ///
    /// Returns a [`SensorError`] for an invalid window.
    pub fn time_window(&self) -> Result<TimeWindow, SensorError> {
        TimeWindow::new(self.start, self.bin_width, self.bins)
    }
}

/// `[engine]`: microscopic transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    pub collision_steps: NonZeroUsize,
    pub seed: u64,
    pub max_steps: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            collision_steps: config.collision_steps,
            seed: config.seed,
            max_steps: config.max_steps,
        }
    }
}

impl EngineSettings {
    #[must_use]
    pub fn config(&self, size_limit: SizeLimit) -> EngineConfig {
        EngineConfig {
            collision_steps: self.collision_steps,
            size_limit,
            seed: self.seed,
            max_steps: self.max_steps,
        }
    }
}

/// `[run]`: execution options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    /// Simulate the seeds of an event in parallel.
    pub parallel: bool,
}
