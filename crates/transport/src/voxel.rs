use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use ndarray::{Array1, Array3};
use thiserror::Error;

use crate::{
    field::{ElectricField, FieldSample},
    interpolation::{Grid, InterpError, Strategy},
};

/// Errors that can occur while building a [`VoxelField`].
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("voxel mesh needs at least two cells along {axis}, got {cells}")]
    TooFewCells { axis: char, cells: usize },

    #[error("voxel mesh extent along {axis} is empty: [{min}, {max}]")]
    EmptyExtent { axis: char, min: f64, max: f64 },

    #[error("failed to read field map")]
    Io(#[from] io::Error),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("field map contains no points inside the mesh")]
    NoData,

    #[error("failed to build field interpolation")]
    Interpolation(#[from] InterpError),
}

/// A regular grid of voxels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelMesh {
    /// Number of voxels along x, y, and z.
    pub cells: [usize; 3],
    /// Lower corner in cm.
    pub min: [f64; 3],
    /// Upper corner in cm.
    pub max: [f64; 3],
}

const AXES: [char; 3] = ['x', 'y', 'z'];

impl VoxelMesh {
    fn validate(&self) -> Result<(), FieldError> {
        for axis in 0..3 {
            if self.cells[axis] < 2 {
                return Err(FieldError::TooFewCells {
                    axis: AXES[axis],
                    cells: self.cells[axis],
                });
            }
            if !(self.min[axis] < self.max[axis]) {
                return Err(FieldError::EmptyExtent {
                    axis: AXES[axis],
                    min: self.min[axis],
                    max: self.max[axis],
                });
            }
        }
        Ok(())
    }

    fn spacing(&self, axis: usize) -> f64 {
        (self.max[axis] - self.min[axis]) / self.cells[axis] as f64
    }

    fn centers(&self, axis: usize) -> Array1<f64> {
        let step = self.spacing(axis);
        Array1::from_shape_fn(self.cells[axis], |i| {
            self.min[axis] + (i as f64 + 0.5) * step
        })
    }

    /// Returns the voxel index containing `coordinate` along `axis`.
    ///
    /// Points on the upper face belong to the last voxel.
    fn index_along(&self, axis: usize, coordinate: f64) -> Option<usize> {
        if !(coordinate >= self.min[axis] && coordinate <= self.max[axis]) {
            return None;
        }
        let index = ((coordinate - self.min[axis]) / self.spacing(axis)).floor() as usize;
        Some(index.min(self.cells[axis] - 1))
    }

    fn voxel_of(&self, point: [f64; 3]) -> Option<[usize; 3]> {
        Some([
            self.index_along(0, point[0])?,
            self.index_along(1, point[1])?,
            self.index_along(2, point[2])?,
        ])
    }
}

/// Column layout and scaling of a field map file.
///
/// Each non-blank line holds `x y z ex ey ez`, optionally followed by the
/// potential and then an integer region index. Lines starting with `#` are
/// comments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldFileFormat {
    pub with_potential: bool,
    pub with_region: bool,
    /// Factor converting file coordinates to cm.
    pub length_scale: f64,
    /// Factor converting file field values to V/cm.
    pub field_scale: f64,
    /// Factor converting file potentials to V.
    pub potential_scale: f64,
}

impl Default for FieldFileFormat {
    fn default() -> Self {
        Self {
            with_potential: true,
            with_region: false,
            length_scale: 1e-4,
            field_scale: 1.0,
            potential_scale: 1.0,
        }
    }
}

impl FieldFileFormat {
    fn columns(&self) -> usize {
        6 + usize::from(self.with_potential) + usize::from(self.with_region)
    }
}

/// Raw per-voxel values collected while reading a field map.
struct VoxelData {
    field: [Array3<f64>; 3],
    potential: Array3<f64>,
    region: Array3<u32>,
    filled: Array3<bool>,
}

impl VoxelData {
    fn new(cells: [usize; 3]) -> Self {
        let shape = (cells[0], cells[1], cells[2]);
        Self {
            field: [
                Array3::zeros(shape),
                Array3::zeros(shape),
                Array3::zeros(shape),
            ],
            potential: Array3::zeros(shape),
            region: Array3::zeros(shape),
            filled: Array3::from_elem(shape, false),
        }
    }
}

/// An electric field map defined on a voxel grid.
///
/// Values are interpolated between voxel centers. Along x and y the map can be
/// repeated periodically; along z, and on any disabled lateral axis, points
/// outside the mesh have no drift medium. When the map carries region indices,
/// only voxels in the drift region hold medium.
pub struct VoxelField {
    mesh: VoxelMesh,
    periodic: [bool; 2],
    components: [Grid; 3],
    potential: Option<Grid>,
    regions: Option<Array3<u32>>,
    drift_region: u32,
}

impl VoxelField {
    /// Loads a field map from a text file.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] if the mesh is invalid, the file cannot be
    /// read or parsed, or no point falls inside the mesh.
    pub fn load(
        path: impl AsRef<Path>,
        mesh: VoxelMesh,
        format: FieldFileFormat,
        strategy: Strategy,
    ) -> Result<Self, FieldError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), mesh, format, strategy)
    }

    /// Reads a field map from any buffered reader.
    ///
    /// # Errors
    ///
    /// Same as [`VoxelField::load`].
    pub fn from_reader(
        reader: impl BufRead,
        mesh: VoxelMesh,
        format: FieldFileFormat,
        strategy: Strategy,
    ) -> Result<Self, FieldError> {
        mesh.validate()?;

        let mut data = VoxelData::new(mesh.cells);
        let mut outside = 0_usize;

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let values = parse_line(trimmed, number + 1, &format)?;
            let point = [
                values[0] * format.length_scale,
                values[1] * format.length_scale,
                values[2] * format.length_scale,
            ];

            let Some([i, j, k]) = mesh.voxel_of(point) else {
                outside += 1;
                continue;
            };

            for (axis, component) in data.field.iter_mut().enumerate() {
                component[[i, j, k]] = values[3 + axis] * format.field_scale;
            }
            if format.with_potential {
                data.potential[[i, j, k]] = values[6] * format.potential_scale;
            }
            if format.with_region {
                let column = if format.with_potential { 7 } else { 6 };
                data.region[[i, j, k]] = region_index(values[column], number + 1)?;
            }
            data.filled[[i, j, k]] = true;
        }

        let filled = data.filled.iter().filter(|&&f| f).count();
        if filled == 0 {
            return Err(FieldError::NoData);
        }
        if outside > 0 {
            log::warn!("{outside} field map points lie outside the voxel mesh and were skipped");
        }
        if filled < data.filled.len() {
            log::warn!(
                "{} of {} voxels have no field map entry and hold zero field",
                data.filled.len() - filled,
                data.filled.len()
            );
        }

        let grid = |values: Array3<f64>| {
            Grid::new(
                mesh.centers(0),
                mesh.centers(1),
                mesh.centers(2),
                values,
                strategy,
            )
        };

        let VoxelData {
            field: [ex, ey, ez],
            potential,
            region,
            ..
        } = data;

        Ok(Self {
            mesh,
            periodic: [false, false],
            components: [grid(ex)?, grid(ey)?, grid(ez)?],
            potential: if format.with_potential {
                Some(grid(potential)?)
            } else {
                None
            },
            regions: format.with_region.then_some(region),
            drift_region: 0,
        })
    }

    /// Repeats the map periodically along x.
    #[must_use]
    pub fn periodic_x(mut self) -> Self {
        self.periodic[0] = true;
        self
    }

    /// Repeats the map periodically along y.
    #[must_use]
    pub fn periodic_y(mut self) -> Self {
        self.periodic[1] = true;
        self
    }

    /// Sets the region index that holds drift medium.
    ///
    /// Only used when the map carries region indices. Defaults to zero.
    #[must_use]
    pub fn with_drift_region(mut self, region: u32) -> Self {
        self.drift_region = region;
        self
    }

    #[must_use]
    pub fn mesh(&self) -> &VoxelMesh {
        &self.mesh
    }

    /// Returns the electrostatic potential (V) at `position`, if available.
    #[must_use]
    pub fn potential(&self, position: [f64; 3]) -> Option<f64> {
        let point = self.locate(position)?;
        self.potential.as_ref()?.at(point).ok()
    }

    /// Maps `position` into the mesh, applying periodicity and region checks.
    fn locate(&self, position: [f64; 3]) -> Option<[f64; 3]> {
        let mut point = position;
        for (axis, coordinate) in point.iter_mut().enumerate() {
            let (min, max) = (self.mesh.min[axis], self.mesh.max[axis]);
            if axis < 2 && self.periodic[axis] {
                *coordinate = min + (*coordinate - min).rem_euclid(max - min);
            } else if !(*coordinate >= min && *coordinate <= max) {
                return None;
            }
        }

        if let Some(regions) = &self.regions {
            let [i, j, k] = self.mesh.voxel_of(point)?;
            if regions[[i, j, k]] != self.drift_region {
                return None;
            }
        }

        Some(point)
    }
}

impl ElectricField for VoxelField {
    fn sample(&self, position: [f64; 3]) -> Option<FieldSample> {
        let point = self.locate(position)?;
        let [ex, ey, ez] = &self.components;
        Some(FieldSample {
            field: [ex.at(point).ok()?, ey.at(point).ok()?, ez.at(point).ok()?],
        })
    }
}

fn parse_line(line: &str, number: usize, format: &FieldFileFormat) -> Result<Vec<f64>, FieldError> {
    let values = line
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| FieldError::Parse {
            line: number,
            reason: err.to_string(),
        })?;

    if values.len() < format.columns() {
        return Err(FieldError::Parse {
            line: number,
            reason: format!(
                "expected {} columns, found {}",
                format.columns(),
                values.len()
            ),
        });
    }

    Ok(values)
}

/// Reads a region column, which must hold a non-negative integer.
fn region_index(value: f64, number: usize) -> Result<u32, FieldError> {
    if value.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&value) {
        return Err(FieldError::Parse {
            line: number,
            reason: format!("region must be a non-negative integer, got {value}"),
        });
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use approx::assert_relative_eq;

    /// A 2×2×2 mesh spanning [0, 2] cm on every axis.
    fn unit_mesh() -> VoxelMesh {
        VoxelMesh {
            cells: [2, 2, 2],
            min: [0.0, 0.0, 0.0],
            max: [2.0, 2.0, 2.0],
        }
    }

    fn plain_format() -> FieldFileFormat {
        FieldFileFormat {
            with_potential: true,
            with_region: false,
            length_scale: 1.0,
            field_scale: 1.0,
            potential_scale: 1.0,
        }
    }

    /// One line per voxel center; ez grows with z, the potential with x.
    fn uniform_map() -> String {
        let mut text = String::from("# x y z ex ey ez v\n");
        for x in [0.5, 1.5] {
            for y in [0.5, 1.5] {
                for z in [0.5, 1.5] {
                    text.push_str(&format!("{x} {y} {z} 0 0 {} {}\n", 100.0 * z, 10.0 * x));
                }
            }
        }
        text
    }

    fn load(text: &str, format: FieldFileFormat) -> Result<VoxelField, FieldError> {
        VoxelField::from_reader(Cursor::new(text), unit_mesh(), format, Strategy::Linear)
    }

    #[test]
    fn interpolates_between_voxel_centers() {
        let field = load(&uniform_map(), plain_format()).unwrap();

        let sample = field.sample([1.0, 1.0, 1.0]).unwrap();
        assert_relative_eq!(sample.field[2], 100.0);
        assert_relative_eq!(field.potential([1.0, 1.0, 1.0]).unwrap(), 10.0);

        // Beyond the outer centers values are clamped.
        let sample = field.sample([1.0, 1.0, 1.9]).unwrap();
        assert_relative_eq!(sample.field[2], 150.0);
    }

    #[test]
    fn outside_the_mesh_there_is_no_medium() {
        let field = load(&uniform_map(), plain_format()).unwrap();

        assert!(field.sample([1.0, 1.0, 2.5]).is_none());
        assert!(field.sample([1.0, 1.0, -0.1]).is_none());
        assert!(field.sample([3.0, 1.0, 1.0]).is_none());
    }

    #[test]
    fn lateral_axes_wrap_when_periodic() {
        let field = load(&uniform_map(), plain_format())
            .unwrap()
            .periodic_x()
            .periodic_y();

        let inside = field.sample([0.5, 0.5, 0.5]).unwrap();
        let wrapped = field.sample([4.5, -1.5, 0.5]).unwrap();
        assert_eq!(inside, wrapped);
        assert_relative_eq!(field.potential([2.5, 0.5, 0.5]).unwrap(), 5.0);

        // The vertical axis never wraps.
        assert!(field.sample([0.5, 0.5, 2.5]).is_none());
    }

    #[test]
    fn coordinates_and_field_are_scaled() {
        let text = "5000 5000 5000 0 0 2 0\n15000 15000 15000 0 0 2 0\n";
        let format = FieldFileFormat {
            length_scale: 1e-4,
            field_scale: 1e3,
            ..plain_format()
        };

        let field = load(text, format).unwrap();
        let sample = field.sample([0.5, 0.5, 0.5]).unwrap();
        assert_relative_eq!(sample.field[2], 2e3);
    }

    #[test]
    fn region_indices_restrict_the_medium() {
        let mut text = String::new();
        for x in [0.5, 1.5] {
            for y in [0.5, 1.5] {
                for z in [0.5, 1.5] {
                    let region = u8::from(z > 1.0);
                    text.push_str(&format!("{x} {y} {z} 0 0 1 {region}\n"));
                }
            }
        }
        let format = FieldFileFormat {
            with_potential: false,
            with_region: true,
            ..plain_format()
        };

        let field = load(&text, format).unwrap();
        assert!(field.sample([1.0, 1.0, 0.5]).is_some());
        assert!(field.sample([1.0, 1.0, 1.5]).is_none());
        assert!(field.potential([1.0, 1.0, 0.5]).is_none());

        let field = load(&text, format).unwrap().with_drift_region(1);
        assert!(field.sample([1.0, 1.0, 0.5]).is_none());
        assert!(field.sample([1.0, 1.0, 1.5]).is_some());
    }

    #[test]
    fn short_lines_are_rejected() {
        let err = load("0.5 0.5 0.5 0 0 1\n", plain_format())
            .err()
            .expect("missing potential column should fail");
        assert!(matches!(err, FieldError::Parse { line: 1, .. }));
    }

    #[test]
    fn invalid_region_indices_are_rejected() {
        let format = FieldFileFormat {
            with_potential: false,
            with_region: true,
            ..plain_format()
        };

        for region in ["-1", "0.5", "nan", "1e12"] {
            let text = format!("0.5 0.5 0.5 0 0 1 0\n0.5 0.5 1.5 0 0 1 {region}\n");
            let err = load(&text, format)
                .err()
                .expect("invalid region should fail");
            let FieldError::Parse { line, reason } = &err else {
                panic!("region {region}: unexpected error {err}");
            };
            assert_eq!(*line, 2);
            assert!(reason.contains("region"), "region {region}: {reason}");
        }
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let err = load("0.5 0.5 abc 0 0 1 0\n", plain_format())
            .err()
            .expect("non-numeric value should fail");
        assert!(matches!(err, FieldError::Parse { line: 1, .. }));
    }

    #[test]
    fn map_without_points_in_mesh_is_rejected() {
        let err = load("9 9 9 0 0 1 0\n", plain_format())
            .err()
            .expect("no usable points should fail");
        assert!(matches!(err, FieldError::NoData));
    }

    #[test]
    fn degenerate_mesh_is_rejected() {
        let mesh = VoxelMesh {
            cells: [2, 1, 2],
            ..unit_mesh()
        };
        let result =
            VoxelField::from_reader(Cursor::new(""), mesh, plain_format(), Strategy::Linear);
        assert!(matches!(
            result,
            Err(FieldError::TooFewCells { axis: 'y', cells: 1 })
        ));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.txt");
        std::fs::write(&path, uniform_map()).unwrap();

        let field =
            VoxelField::load(&path, unit_mesh(), plain_format(), Strategy::Nearest).unwrap();
        let sample = field.sample([0.6, 0.6, 0.6]).unwrap();
        assert_relative_eq!(sample.field[2], 50.0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = VoxelField::load(
            "/nonexistent/field.txt",
            unit_mesh(),
            plain_format(),
            Strategy::Linear,
        );
        assert!(matches!(result, Err(FieldError::Io(_))));
    }
}
