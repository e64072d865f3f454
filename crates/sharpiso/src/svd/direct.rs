//! Direct pseudo-inverse solve of the plane system.

use nalgebra::DVector;

use super::decomposition::RankDecomposition;
use super::system::LinearSystem;
use super::types::{ReconstructedPoint, SolveError, SvdConfig};
use crate::sample::GradientSample;

/// Least-squares intersection of the sample isoplanes with unit-normalized
/// gradients and up to three retained singular values.
///
/// Rank 0 (every gradient negligible, or all singular values below
/// `error_tolerance · σ_max`) returns `reference_point`.
///
/// `error_tolerance` is expected in `(0, 1)`; see [`SvdConfig::validate`].
pub fn solve_sharp_point(
    samples: &[GradientSample],
    isovalue: f64,
    reference_point: [f64; 3],
    error_tolerance: f64,
) -> Result<ReconstructedPoint, SolveError> {
    let config = SvdConfig {
        error_tolerance,
        ..SvdConfig::default()
    };
    solve_direct(samples, isovalue, reference_point, &config)
}

/// Direct solve `x = r + A⁺(B − A r)` about `reference_point` `r`, honoring
/// `normalize_gradients` and `max_rank`.
///
/// At full rank this is `A⁺B`. Unconstrained directions keep the coordinate
/// of `r`, so edge and smooth vertices stay at the reference cube.
pub fn solve_direct(
    samples: &[GradientSample],
    isovalue: f64,
    reference_point: [f64; 3],
    config: &SvdConfig,
) -> Result<ReconstructedPoint, SolveError> {
    if samples.is_empty() {
        return Err(SolveError::NoSamples);
    }
    let system = LinearSystem::from_samples(samples, isovalue, config.normalize_gradients);
    let dec = RankDecomposition::new(&system.a, config.error_tolerance, config.max_rank);
    if dec.rank() == 0 {
        return Ok(ReconstructedPoint::fallback(reference_point));
    }

    let r = DVector::from_column_slice(&reference_point);
    let dx = dec.pseudo_inverse() * (&system.b - &system.a * &r);
    Ok(ReconstructedPoint {
        coord: [
            reference_point[0] + dx[0],
            reference_point[1] + dx[1],
            reference_point[2] + dx[2],
        ],
        singular_values: dec.retained_singular_values(),
        rank: dec.rank(),
        free_direction: dec.free_direction(),
    })
}
