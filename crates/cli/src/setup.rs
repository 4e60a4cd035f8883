//! Assembly of the simulation objects from settings.

use anyhow::{Context, Result};
use avalanche_core::SimulationDomain;
use avalanche_transport::{
    DriftVolume, ElectricField, FieldSample, MicroscopicAvalanche, Sensor, UniformField,
    VoxelField,
};

use crate::settings::{FieldSettings, Settings};

/// The field selected in the settings.
pub enum Field {
    Voxel(VoxelField),
    Uniform(UniformField),
}

impl ElectricField for Field {
    fn sample(&self, position: [f64; 3]) -> Option<FieldSample> {
        match self {
            Self::Voxel(field) => field.sample(position),
            Self::Uniform(field) => field.sample(position),
        }
    }
}

/// Derives the simulation area and avalanche size limit.
///
/// # Errors
///
/// Returns an error if the detector or amplification geometry is invalid.
pub fn domain(settings: &Settings) -> Result<SimulationDomain> {
    let domain = SimulationDomain::new(
        &settings.detector.geometry(),
        &settings.amplification.region(),
        settings.amplification.max_avalanche_size,
    )
    .context("invalid simulation geometry")?;

    let (xmin, xmax, ymin, ymax, zmin, zmax) = domain.bounds.as_tuple();
    log::info!(
        "simulation area x [{xmin}, {xmax}] y [{ymin}, {ymax}] z [{zmin}, {zmax}] cm, avalanche size limit {}",
        domain.size_limit.cap()
    );

    Ok(domain)
}

/// Loads or builds the configured field.
///
/// # Errors
///
/// Returns an error if the field map cannot be loaded.
pub fn field(settings: &FieldSettings) -> Result<Field> {
    match settings {
        FieldSettings::Uniform { field } => Ok(Field::Uniform(UniformField { field: *field })),
        FieldSettings::Voxel(voxel) => {
            let mut map = VoxelField::load(
                &voxel.file,
                voxel.mesh(),
                voxel.format(),
                voxel.interpolation,
            )
            .with_context(|| format!("failed to load field map {}", voxel.file.display()))?;

            if voxel.periodic_x {
                map = map.periodic_x();
            }
            if voxel.periodic_y {
                map = map.periodic_y();
            }
            if voxel.with_region {
                map = map.with_drift_region(voxel.drift_region);
            }

            log::info!("loaded field map {}", voxel.file.display());
            Ok(Field::Voxel(map))
        }
    }
}

/// Builds the avalanche engine: domain, field, gas medium, and sensor.
///
/// The gas tables are built here, so a failure aborts the run before any
/// event is read.
///
/// # Errors
///
/// Returns an error if any piece of the setup is invalid.
pub fn engine(settings: &Settings) -> Result<MicroscopicAvalanche<Field>> {
    let domain = domain(settings)?;
    let field = field(&settings.field)?;

    let mixture = settings
        .detector
        .mixture()
        .context("invalid gas composition")?
        .with_max_electron_energy(settings.gas.max_electron_energy)
        .enable_drift();
    let medium = mixture
        .initialise()
        .with_context(|| format!("failed to initialise gas {mixture}"))?;
    log::info!(
        "initialised gas {mixture}, mean free path {:.3e} cm",
        medium.mean_free_path()
    );

    let time_window = settings
        .sensor
        .time_window()
        .context("invalid sensor time window")?;
    let sensor = Sensor::new(
        DriftVolume::new(field, medium),
        domain.bounds,
        settings.sensor.readout.as_str(),
        time_window,
    )
    .context("invalid sensor")?;

    Ok(MicroscopicAvalanche::new(
        sensor,
        settings.engine.config(domain.size_limit),
    ))
}
