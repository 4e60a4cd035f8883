//! Event iteration and endpoint aggregation for avalanche simulation runs.
//!
//! A run reads drift-stage events ([`DriftRow`]), asks an
//! [`AvalancheEngine`](avalanche_core::AvalancheEngine) for the avalanche of
//! every seed electron, and emits one [`AvalancheRow`] per event holding all
//! of the event's endpoints in seed order. See [`run::run`].
//!
//! Record files store rows as JSON Lines under a named tree, see
//! [`read_records`] and [`RecordWriter`].

pub mod run;

mod cancel;
mod record_file;
mod schema;
mod sink;

pub use cancel::CancelToken;
pub use record_file::{Record, RecordFileError, RecordSet, RecordWriter, read_records};
pub use schema::{
    AVALANCHE_COLUMNS, AVALANCHE_TREE, AvalancheRow, DRIFT_COLUMNS, DRIFT_TREE, DriftRow,
    SchemaError,
};
pub use sink::RecordSink;
