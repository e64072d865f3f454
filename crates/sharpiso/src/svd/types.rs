use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

// ── Errors ─────────────────────────────────────────────────────────────────

/// Errors returned by the solvers.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// The sample list is empty; the caller decides where the vertex goes.
    NoSamples,
}

impl std::fmt::Display for SolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSamples => write!(f, "no gradient samples to solve"),
        }
    }
}

impl std::error::Error for SolveError {}

// ── Result ─────────────────────────────────────────────────────────────────

/// Geometric feature implied by the number of independent plane normals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// No usable direction; the point is the fallback.
    Undetermined,
    /// One normal direction: a smooth patch.
    Smooth,
    /// Two normal directions: a sharp edge.
    Edge,
    /// Three normal directions: a sharp corner.
    Corner,
}

/// Output of the least-squares solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconstructedPoint {
    /// Solved position in grid space.
    pub coord: [f64; 3],
    /// Retained singular values, descending, zero-padded.
    pub singular_values: [f64; 3],
    /// Number of retained singular values (0..=3).
    pub rank: usize,
    /// Unit direction of the unconstrained axis; present only for rank 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_direction: Option<[f64; 3]>,
}

impl ReconstructedPoint {
    /// Rank-0 result located at `coord`.
    pub fn fallback(coord: [f64; 3]) -> Self {
        Self {
            coord,
            singular_values: [0.0; 3],
            rank: 0,
            free_direction: None,
        }
    }

    /// Feature class implied by the retained rank.
    pub fn feature(&self) -> FeatureKind {
        match self.rank {
            0 => FeatureKind::Undetermined,
            1 => FeatureKind::Smooth,
            2 => FeatureKind::Edge,
            _ => FeatureKind::Corner,
        }
    }

    /// True for edges and corners.
    pub fn is_sharp(&self) -> bool {
        self.rank >= 2
    }
}

// ── Configuration ──────────────────────────────────────────────────────────

/// Least-squares formulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    /// Pseudo-inverse solve of the plane system `A x = B`.
    #[default]
    Direct,
    /// Solve relative to a mass point: `x = m + A⁺(B − A m)`.
    Lindstrom,
    /// As [`SolveMethod::Lindstrom`], with `A` replaced by its rank-truncated
    /// reconstruction in the residual term.
    Lindstrom2,
    /// Lindstrom formulation on the accumulated 3×3 normal equations.
    LindstromFast,
}

/// Linearization point of the Lindstrom formulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassPoint {
    /// Center of the query cube.
    CubeCenter,
    /// Weighted centroid of the sample positions.
    #[default]
    SampleCentroid,
}

/// Solver parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvdConfig {
    /// Least-squares formulation.
    pub method: SolveMethod,
    /// Singular values `<= error_tolerance * σ_max` are discarded. Must lie in `(0, 1)`.
    pub error_tolerance: f64,
    /// Divide every plane equation by its gradient magnitude.
    ///
    /// The Lindstrom formulations always normalize.
    pub normalize_gradients: bool,
    /// Upper bound on the retained rank (1..=3).
    pub max_rank: usize,
    /// Linearization point of the Lindstrom formulations.
    pub mass_point: MassPoint,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            method: SolveMethod::Direct,
            error_tolerance: 0.1,
            normalize_gradients: true,
            max_rank: 3,
            mass_point: MassPoint::SampleCentroid,
        }
    }
}

impl SvdConfig {
    /// Check the tolerance range and `max_rank`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_tolerance(self.error_tolerance)?;
        if !(1..=3).contains(&self.max_rank) {
            return Err(ConfigError::InvalidMaxRank {
                value: self.max_rank,
            });
        }
        Ok(())
    }
}

pub(crate) fn validate_tolerance(tol: f64) -> Result<(), ConfigError> {
    if !tol.is_finite() || tol <= 0.0 || tol >= 1.0 {
        return Err(ConfigError::DegenerateTolerance { value: tol });
    }
    Ok(())
}
