//! Column layout of the drift input and avalanche output records.
//!
//! Each record is one event. Per-electron quantities are stored as parallel
//! columns: index `i` of every sequence column describes the same electron.

use avalanche_core::{AvalancheEndpoint, ElectronState, SeedElectron};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tree name of drift-stage input files.
pub const DRIFT_TREE: &str = "driftTree";

/// Tree name of avalanche output files.
pub const AVALANCHE_TREE: &str = "avalancheTree";

/// Columns read from each drift record.
pub const DRIFT_COLUMNS: [&str; 6] = ["nele", "x1", "y1", "z1", "e1", "t1"];

/// Columns written to each avalanche record.
pub const AVALANCHE_COLUMNS: [&str; 13] = [
    "nele", "nelep", "status", "x0", "y0", "z0", "e0", "t0", "x1", "y1", "z1", "e1", "t1",
];

/// Errors raised when a drift record does not match its declared size.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("electron count must be non-negative, got {nele}")]
    NegativeCount { nele: i32 },

    #[error("column `{column}` holds {len} values but the event has {nele} electrons")]
    ColumnTooShort {
        column: &'static str,
        len: usize,
        nele: usize,
    },
}

/// One event of drift-stage output: the electrons entering amplification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftRow {
    pub nele: i32,
    pub x1: Vec<f64>,
    pub y1: Vec<f64>,
    pub z1: Vec<f64>,
    pub e1: Vec<f64>,
    pub t1: Vec<f64>,
}

impl DriftRow {
    /// Builds a record holding `seeds` in order.
    #[must_use]
    pub fn from_seeds(seeds: &[SeedElectron]) -> Self {
        Self {
            nele: i32::try_from(seeds.len()).unwrap_or(i32::MAX),
            x1: seeds.iter().map(|s| s.position[0]).collect(),
            y1: seeds.iter().map(|s| s.position[1]).collect(),
            z1: seeds.iter().map(|s| s.position[2]).collect(),
            e1: seeds.iter().map(|s| s.energy).collect(),
            t1: seeds.iter().map(|s| s.time).collect(),
        }
    }

    /// Returns the first `nele` seed electrons of the event.
    ///
    /// Columns longer than `nele` are allowed; the extra values are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if `nele` is negative or any column holds
    /// fewer than `nele` values.
    pub fn seeds(&self) -> Result<Vec<SeedElectron>, SchemaError> {
        let nele = usize::try_from(self.nele)
            .map_err(|_| SchemaError::NegativeCount { nele: self.nele })?;

        let columns = [
            ("x1", &self.x1),
            ("y1", &self.y1),
            ("z1", &self.z1),
            ("e1", &self.e1),
            ("t1", &self.t1),
        ];
        for (column, values) in columns {
            if values.len() < nele {
                return Err(SchemaError::ColumnTooShort {
                    column,
                    len: values.len(),
                    nele,
                });
            }
        }

        Ok((0..nele)
            .map(|i| SeedElectron {
                position: [self.x1[i], self.y1[i], self.z1[i]],
                energy: self.e1[i],
                time: self.t1[i],
            })
            .collect())
    }
}

/// One event of avalanche output: every endpoint produced by its seeds.
///
/// Records are built with [`AvalancheRow::new`] and grown with
/// [`AvalancheRow::push`], which keeps `nelep` equal to the number of
/// endpoints and all columns the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvalancheRow {
    /// Seed electron count copied from the drift record.
    pub nele: i32,
    /// Number of endpoints in the record.
    pub nelep: i32,
    pub status: Vec<i32>,
    pub x0: Vec<f64>,
    pub y0: Vec<f64>,
    pub z0: Vec<f64>,
    pub e0: Vec<f64>,
    pub t0: Vec<f64>,
    pub x1: Vec<f64>,
    pub y1: Vec<f64>,
    pub z1: Vec<f64>,
    pub e1: Vec<f64>,
    pub t1: Vec<f64>,
}

impl AvalancheRow {
    /// Creates an empty record for an event with `nele` seed electrons.
    #[must_use]
    pub fn new(nele: i32) -> Self {
        Self {
            nele,
            ..Self::default()
        }
    }

    /// Appends one endpoint to every column.
    pub fn push(&mut self, endpoint: &AvalancheEndpoint) {
        let AvalancheEndpoint { start, end, status } = endpoint;

        self.status.push(*status);
        self.x0.push(start.position[0]);
        self.y0.push(start.position[1]);
        self.z0.push(start.position[2]);
        self.e0.push(start.energy);
        self.t0.push(start.time);
        self.x1.push(end.position[0]);
        self.y1.push(end.position[1]);
        self.z1.push(end.position[2]);
        self.e1.push(end.energy);
        self.t1.push(end.time);
        self.nelep = self.nelep.saturating_add(1);
    }

    /// Appends endpoints in order.
    pub fn extend<'a>(&mut self, endpoints: impl IntoIterator<Item = &'a AvalancheEndpoint>) {
        for endpoint in endpoints {
            self.push(endpoint);
        }
    }

    /// Returns the number of endpoints in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.status.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }

    /// Returns whether all columns have the same length and `nelep` counts them.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let len = self.len();
        [
            &self.x0, &self.y0, &self.z0, &self.e0, &self.t0, &self.x1, &self.y1, &self.z1,
            &self.e1, &self.t1,
        ]
        .iter()
        .all(|column| column.len() == len)
            && usize::try_from(self.nelep).is_ok_and(|nelep| nelep == len)
    }

    /// Returns the endpoint stored at `index`.
    #[must_use]
    pub fn endpoint(&self, index: usize) -> Option<AvalancheEndpoint> {
        let state = |x: &[f64], y: &[f64], z: &[f64], e: &[f64], t: &[f64]| {
            Some(ElectronState {
                position: [*x.get(index)?, *y.get(index)?, *z.get(index)?],
                time: *t.get(index)?,
                energy: *e.get(index)?,
            })
        };

        Some(AvalancheEndpoint {
            start: state(&self.x0, &self.y0, &self.z0, &self.e0, &self.t0)?,
            end: state(&self.x1, &self.y1, &self.z1, &self.e1, &self.t1)?,
            status: *self.status.get(index)?,
        })
    }
}
