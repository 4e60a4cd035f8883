//! Core types and traits for simulating electron avalanches.
//!
//! This crate defines the shared abstractions that the transport engine, the
//! event pipeline, and the observers build on:
//!
//! - [`SeedElectron`]: an electron entering the amplification region
//! - [`AvalancheEndpoint`]: the start and end state of one avalanche electron
//! - [`AvalancheEngine`]: the capability that turns one seed into an [`Avalanche`]
//! - [`SimulationDomain`]: the bounding box and size cap fixed for a run
//! - [`Observer`]: receives run events and optionally returns control actions
//!
//! Engine coordinates are plain `f64` values in centimeters, nanoseconds,
//! electronvolts, and volts per centimeter. Configuration-facing quantities
//! use [`uom`] types and are converted at the boundary.

mod domain;
mod electron;
mod engine;
mod observer;
mod start;

pub use domain::{
    AmplificationRegion, BoundingBox, DetectorGeometry, DomainError, SimulationDomain, SizeLimit,
};
pub use electron::{AvalancheEndpoint, ElectronKey, ElectronState, InitialState, SeedElectron};
pub use engine::{Avalanche, AvalancheEngine};
pub use observer::Observer;
pub use start::StartHeight;

/// Unit direction pointing straight down the drift axis.
pub const DOWNWARD: [f64; 3] = [0.0, 0.0, -1.0];
