//! Reusable observers for avalanche simulation runs.
//!
//! This crate provides [`Observer`] implementations and the capability traits
//! they are written against, so they work with any event and action types
//! that expose the needed information.
//!
//! # Modules
//!
//! - [`traits`]: capability traits ([`HasProgress`], [`HasRecord`],
//!   [`CanStopEarly`])
//!
//! # Observers
//!
//! - [`ProgressLogger`] reports completion percentages through `log`.
//! - [`EventLimit`] stops a run after a number of written records.
//!
//! [`Observer`]: avalanche_core::Observer
//! [`HasProgress`]: traits::HasProgress
//! [`HasRecord`]: traits::HasRecord
//! [`CanStopEarly`]: traits::CanStopEarly

pub mod traits;

mod limit;
mod progress;

pub use limit::EventLimit;
pub use progress::ProgressLogger;
