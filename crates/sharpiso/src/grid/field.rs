//! Owned scalar grid with per-vertex gradients.
//!
//! JSON grids follow the `sharpiso.grid.v1` schema: axis sizes, scalars in
//! x-fastest order and optional gradients. Missing gradients are computed by
//! central differences.

use std::path::Path;

use super::gradient::central_difference_gradients;
use super::GridField;

/// Schema tag accepted by [`ScalarGrid::from_spec`].
pub const GRID_SCHEMA: &str = "sharpiso.grid.v1";

/// Errors raised while building a [`ScalarGrid`].
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// An axis has fewer than two vertices, so the grid has no cubes.
    AxisTooSmall {
        /// Axis (0 = x, 1 = y, 2 = z).
        axis: usize,
        /// Number of vertices along that axis.
        size: usize,
    },
    /// A per-vertex array does not have one entry per vertex.
    LengthMismatch {
        /// Which array is mismatched.
        what: &'static str,
        /// Number of grid vertices.
        expected: usize,
        /// Provided number of entries.
        got: usize,
    },
    /// JSON grid uses a different schema tag.
    UnsupportedSchema {
        /// Schema string found in the input.
        found: String,
    },
    /// A scalar value is NaN or infinite.
    NonFiniteScalar {
        /// Vertex index of the first offending value.
        index: usize,
    },
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AxisTooSmall { axis, size } => {
                write!(f, "axis {} has {} vertices, need at least 2", axis, size)
            }
            Self::LengthMismatch {
                what,
                expected,
                got,
            } => write!(f, "{}: expected {} entries, got {}", what, expected, got),
            Self::UnsupportedSchema { found } => write!(
                f,
                "unsupported grid schema '{}' (expected '{}')",
                found, GRID_SCHEMA
            ),
            Self::NonFiniteScalar { index } => {
                write!(f, "non-finite scalar at vertex {}", index)
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Serialized form of a [`ScalarGrid`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScalarGridSpec {
    /// Must equal [`GRID_SCHEMA`].
    pub schema: String,
    /// Number of vertices along x, y and z.
    pub axis_size: [usize; 3],
    /// Scalar values, x varying fastest.
    pub scalars: Vec<f64>,
    /// Optional per-vertex gradients; computed when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradients: Option<Vec<[f64; 3]>>,
}

/// Regular grid storing one scalar and one gradient per vertex.
#[derive(Debug, Clone)]
pub struct ScalarGrid {
    axis_size: [usize; 3],
    scalars: Vec<f64>,
    gradients: Vec<[f64; 3]>,
}

impl ScalarGrid {
    /// Build a grid from explicit scalar and gradient arrays.
    pub fn new(
        axis_size: [usize; 3],
        scalars: Vec<f64>,
        gradients: Vec<[f64; 3]>,
    ) -> Result<Self, GridError> {
        let n = validate_axis_size(axis_size)?;
        check_len("scalars", n, scalars.len())?;
        check_len("gradients", n, gradients.len())?;
        Ok(Self {
            axis_size,
            scalars,
            gradients,
        })
    }

    /// Build a grid from scalars only; gradients come from central differences.
    pub fn from_scalars(axis_size: [usize; 3], scalars: Vec<f64>) -> Result<Self, GridError> {
        let n = validate_axis_size(axis_size)?;
        check_len("scalars", n, scalars.len())?;
        let gradients = central_difference_gradients(axis_size, &scalars)?;
        Ok(Self {
            axis_size,
            scalars,
            gradients,
        })
    }

    /// Sample `f` at every vertex position; gradients come from central differences.
    pub fn from_fn(axis_size: [usize; 3], f: impl Fn([f64; 3]) -> f64) -> Result<Self, GridError> {
        validate_axis_size(axis_size)?;
        let scalars = sample_positions(axis_size).map(&f).collect();
        Self::from_scalars(axis_size, scalars)
    }

    /// Sample `f` and its analytic gradient `grad` at every vertex position.
    pub fn from_fn_with_gradient(
        axis_size: [usize; 3],
        f: impl Fn([f64; 3]) -> f64,
        grad: impl Fn([f64; 3]) -> [f64; 3],
    ) -> Result<Self, GridError> {
        validate_axis_size(axis_size)?;
        let scalars = sample_positions(axis_size).map(&f).collect();
        let gradients = sample_positions(axis_size).map(&grad).collect();
        Self::new(axis_size, scalars, gradients)
    }

    /// Load a grid from a `sharpiso.grid.v1` JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let spec: ScalarGridSpec = serde_json::from_str(&data)?;
        Self::from_spec(spec).map_err(Into::into)
    }

    /// Build a grid from its serialized form, computing gradients when absent.
    pub fn from_spec(spec: ScalarGridSpec) -> Result<Self, GridError> {
        if spec.schema != GRID_SCHEMA {
            return Err(GridError::UnsupportedSchema { found: spec.schema });
        }
        if let Some(index) = spec.scalars.iter().position(|s| !s.is_finite()) {
            return Err(GridError::NonFiniteScalar { index });
        }
        match spec.gradients {
            Some(gradients) => Self::new(spec.axis_size, spec.scalars, gradients),
            None => Self::from_scalars(spec.axis_size, spec.scalars),
        }
    }

    /// Serialized form, gradients included.
    pub fn to_spec(&self) -> ScalarGridSpec {
        ScalarGridSpec {
            schema: GRID_SCHEMA.to_string(),
            axis_size: self.axis_size,
            scalars: self.scalars.clone(),
            gradients: Some(self.gradients.clone()),
        }
    }

    /// Scalar values, x varying fastest.
    pub fn scalars(&self) -> &[f64] {
        &self.scalars
    }

    /// Per-vertex gradients, same order as [`ScalarGrid::scalars`].
    pub fn gradients(&self) -> &[[f64; 3]] {
        &self.gradients
    }

    /// Replace the gradients, e.g. with smoothed or analytic ones.
    pub fn set_gradients(&mut self, gradients: Vec<[f64; 3]>) -> Result<(), GridError> {
        check_len("gradients", self.scalars.len(), gradients.len())?;
        self.gradients = gradients;
        Ok(())
    }
}

impl GridField for ScalarGrid {
    fn axis_size(&self) -> [usize; 3] {
        self.axis_size
    }

    #[inline]
    fn scalar(&self, iv: usize) -> f64 {
        self.scalars[iv]
    }

    #[inline]
    fn gradient(&self, iv: usize) -> [f64; 3] {
        self.gradients[iv]
    }
}

pub(super) fn validate_axis_size(axis_size: [usize; 3]) -> Result<usize, GridError> {
    for (axis, &size) in axis_size.iter().enumerate() {
        if size < 2 {
            return Err(GridError::AxisTooSmall { axis, size });
        }
    }
    Ok(axis_size.iter().product())
}

pub(super) fn check_len(what: &'static str, expected: usize, got: usize) -> Result<(), GridError> {
    if expected != got {
        return Err(GridError::LengthMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}

/// Vertex positions in index order (x fastest).
fn sample_positions(axis_size: [usize; 3]) -> impl Iterator<Item = [f64; 3]> {
    let [nx, ny, nz] = axis_size;
    (0..nz).flat_map(move |z| {
        (0..ny).flat_map(move |y| (0..nx).map(move |x| [x as f64, y as f64, z as f64]))
    })
}
