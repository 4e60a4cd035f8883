//! Field, medium, and microscopic transport for avalanche simulation.
//!
//! The pieces are assembled bottom-up, mirroring how a detector is described:
//!
//! 1. An [`ElectricField`], either a [`VoxelField`] loaded from a field map or
//!    a [`UniformField`].
//! 2. A [`GasMixture`] whose [`initialise`](GasMixture::initialise) builds the
//!    [`TransportTable`] of transport coefficients.
//! 3. A [`DriftVolume`] binding the field to the medium, and a [`Sensor`]
//!    binding the volume to the simulation area, readout, and time window.
//! 4. A [`MicroscopicAvalanche`] engine that simulates avalanches inside the
//!    sensor.

mod field;
mod gas;
mod interpolation;
mod microscopic;
mod sensor;
mod status;
mod table;
mod voxel;

pub use field::{ElectricField, FieldSample, UniformField};
pub use gas::{Gas, GasError, GasMixture};
pub use interpolation::{InterpError, Strategy};
pub use microscopic::{EngineConfig, MicroscopicAvalanche};
pub use sensor::{DriftVolume, MediumSample, Sensor, SensorError, TimeWindow};
pub use status::Status;
pub use table::{Coefficients, TransportTable};
pub use voxel::{FieldError, FieldFileFormat, VoxelField, VoxelMesh};
