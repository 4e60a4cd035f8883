use ndarray::{Array1, Array3};
use ninterp::{
    error::{InterpolateError, ValidateError},
    interpolator::Extrapolate,
    prelude::{Interp1DOwned, Interp3DOwned, Interpolator},
    strategy::enums::{Strategy1DEnum, Strategy3DEnum},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterpError {
    #[error(transparent)]
    Validation(#[from] ValidateError),
    #[error(transparent)]
    Interpolation(#[from] InterpolateError),
}

/// How values are estimated between grid points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Linear (or trilinear) interpolation between surrounding grid points.
    #[default]
    Linear,
    /// The value of the closest grid point.
    Nearest,
}

/// A tabulated function of one variable, clamped at the table ends.
pub(crate) struct Curve(Interp1DOwned<f64, Strategy1DEnum>);

impl Curve {
    pub(crate) fn new(x: Array1<f64>, f_x: Array1<f64>) -> Result<Self, InterpError> {
        Ok(Self(Interp1DOwned::new(
            x,
            f_x,
            ninterp::strategy::Linear.into(),
            Extrapolate::Clamp,
        )?))
    }

    pub(crate) fn at(&self, x: f64) -> Result<f64, InterpError> {
        self.0.interpolate(&[x]).map_err(Into::into)
    }
}

/// Values on a regular 3D grid, clamped at the grid faces.
pub(crate) struct Grid(Interp3DOwned<f64, Strategy3DEnum>);

impl Grid {
    pub(crate) fn new(
        x: Array1<f64>,
        y: Array1<f64>,
        z: Array1<f64>,
        f_xyz: Array3<f64>,
        strategy: Strategy,
    ) -> Result<Self, InterpError> {
        let strategy: Strategy3DEnum = match strategy {
            Strategy::Linear => ninterp::strategy::Linear.into(),
            Strategy::Nearest => ninterp::strategy::Nearest.into(),
        };
        Ok(Self(Interp3DOwned::new(
            x,
            y,
            z,
            f_xyz,
            strategy,
            Extrapolate::Clamp,
        )?))
    }

    pub(crate) fn at(&self, point: [f64; 3]) -> Result<f64, InterpError> {
        self.0.interpolate(&point).map_err(Into::into)
    }
}
