use std::num::NonZeroUsize;

use thiserror::Error;
use uom::si::{f64::Length, length::centimeter};

/// Lateral size of the detector's active area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorGeometry {
    pub size_x: Length,
    pub size_y: Length,
}

/// Vertical extent of the amplification region.
///
/// `z_max` is where electrons enter from the drift region, `z_min` is a small
/// margin below the readout plane, and `z_max_safety` extends the domain above
/// `z_max` to cover the inhomogeneous field just above the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplificationRegion {
    pub z_min: Length,
    pub z_max: Length,
    pub z_max_safety: Length,
}

impl AmplificationRegion {
    /// Returns the height at which seed electrons start, in cm.
    #[must_use]
    pub fn start_height(&self) -> f64 {
        self.z_max.get::<centimeter>()
    }
}

/// Errors raised when deriving a [`SimulationDomain`] from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DomainError {
    #[error("detector size along {axis} must be positive and finite, got {value} cm")]
    InvalidSize { axis: char, value: f64 },

    #[error("z bounds are empty: z_min = {z_min} cm, z_max + safety = {z_max} cm")]
    EmptyHeight { z_min: f64, z_max: f64 },

    #[error("z_max_safety must be non-negative, got {value} cm")]
    NegativeSafety { value: f64 },
}

/// Axis-aligned box in cm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Returns whether `point` lies inside the box, boundaries included.
    #[must_use]
    pub fn contains(&self, point: [f64; 3]) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Returns the bounds as `(xmin, xmax, ymin, ymax, zmin, zmax)`.
    #[must_use]
    pub fn as_tuple(&self) -> (f64, f64, f64, f64, f64, f64) {
        (
            self.min[0],
            self.max[0],
            self.min[1],
            self.max[1],
            self.min[2],
            self.max[2],
        )
    }
}

/// Upper bound on the number of electrons in a single avalanche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeLimit {
    /// Multiplication is never cut short.
    #[default]
    Unlimited,
    /// Multiplication stops once the avalanche holds this many electrons.
    AtMost(NonZeroUsize),
}

impl SizeLimit {
    /// Interprets a configured cap, where zero means no limit.
    #[must_use]
    pub fn from_cap(cap: usize) -> Self {
        NonZeroUsize::new(cap).map_or(Self::Unlimited, Self::AtMost)
    }

    /// Returns the cap, with zero meaning no limit.
    #[must_use]
    pub fn cap(&self) -> usize {
        match self {
            Self::Unlimited => 0,
            Self::AtMost(n) => n.get(),
        }
    }

    /// Returns whether an avalanche holding `electrons` may grow further.
    #[must_use]
    pub fn allows_growth(&self, electrons: usize) -> bool {
        match self {
            Self::Unlimited => true,
            Self::AtMost(n) => electrons < n.get(),
        }
    }
}

/// The spatial domain and size cap shared by every avalanche in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationDomain {
    pub bounds: BoundingBox,
    pub size_limit: SizeLimit,
}

impl SimulationDomain {
    /// Derives the domain from the detector and amplification geometry.
    ///
    /// The x and y bounds are centered on zero at half the detector size. The
    /// z bounds run from `z_min` to `z_max + z_max_safety`.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if a detector size is not positive, the
    /// safety margin is negative, or the z range is empty.
    pub fn new(
        detector: &DetectorGeometry,
        region: &AmplificationRegion,
        max_avalanche_size: usize,
    ) -> Result<Self, DomainError> {
        let half_x = half_size('x', detector.size_x)?;
        let half_y = half_size('y', detector.size_y)?;

        let safety = region.z_max_safety.get::<centimeter>();
        if !(safety >= 0.0) {
            return Err(DomainError::NegativeSafety { value: safety });
        }

        let z_min = region.z_min.get::<centimeter>();
        let z_max = region.z_max.get::<centimeter>() + safety;
        if !(z_min < z_max) {
            return Err(DomainError::EmptyHeight { z_min, z_max });
        }

        Ok(Self {
            bounds: BoundingBox {
                min: [-half_x, -half_y, z_min],
                max: [half_x, half_y, z_max],
            },
            size_limit: SizeLimit::from_cap(max_avalanche_size),
        })
    }
}

fn half_size(axis: char, size: Length) -> Result<f64, DomainError> {
    let value = size.get::<centimeter>();
    if value.is_finite() && value > 0.0 {
        Ok(value / 2.0)
    } else {
        Err(DomainError::InvalidSize { axis, value })
    }
}
