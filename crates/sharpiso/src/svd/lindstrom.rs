//! Mass-point (Lindstrom) formulations.
//!
//! The solution is expressed as an offset from a mass point `m`:
//! `x = m + A⁺(B − A'm)`. Directions dropped by rank truncation keep the
//! coordinate of `m` instead of collapsing toward the origin, which places
//! edge vertices next to the samples along the free direction.

use nalgebra::{DVector, Matrix3, Vector3};

use super::decomposition::RankDecomposition;
use super::system::LinearSystem;
use super::types::{ReconstructedPoint, SolveError, SolveMethod, SvdConfig};
use crate::sample::{weighted_centroid, GradientSample, ZERO_GRADIENT_TOLERANCE};

/// `x = m + A⁺(B − A m)` on the normalized plane system.
pub fn solve_lindstrom(
    samples: &[GradientSample],
    isovalue: f64,
    mass_point: [f64; 3],
    config: &SvdConfig,
) -> Result<ReconstructedPoint, SolveError> {
    solve_about_mass_point(samples, isovalue, mass_point, config, false)
}

/// `x = m + A⁺(B − A'm)` with `A' = U Σ_r Vᵗ`, the rank-truncated system.
pub fn solve_lindstrom_truncated(
    samples: &[GradientSample],
    isovalue: f64,
    mass_point: [f64; 3],
    config: &SvdConfig,
) -> Result<ReconstructedPoint, SolveError> {
    solve_about_mass_point(samples, isovalue, mass_point, config, true)
}

fn solve_about_mass_point(
    samples: &[GradientSample],
    isovalue: f64,
    mass_point: [f64; 3],
    config: &SvdConfig,
    truncate_residual: bool,
) -> Result<ReconstructedPoint, SolveError> {
    if samples.is_empty() {
        return Err(SolveError::NoSamples);
    }
    let system = LinearSystem::from_samples(samples, isovalue, true);
    let dec = RankDecomposition::new(&system.a, config.error_tolerance, config.max_rank);
    if dec.rank() == 0 {
        return Ok(ReconstructedPoint::fallback(mass_point));
    }

    let m = DVector::from_column_slice(&mass_point);
    let rhs = if truncate_residual {
        &system.b - dec.truncated_matrix() * &m
    } else {
        &system.b - &system.a * &m
    };
    let dx = dec.pseudo_inverse() * rhs;
    Ok(offset_result(&dec, mass_point, [dx[0], dx[1], dx[2]]))
}

/// Lindstrom solve on the accumulated 3×3 normal equations.
///
/// `A = Σ w n nᵗ`, `B = Σ w n (n·p − (s − isovalue)/|g|)` with `n` the unit
/// gradient. Gradients of magnitude `<= ZERO_GRADIENT_TOLERANCE` are skipped.
/// The reported singular values are those of the 3×3 matrix `A`, i.e. the
/// squares of the plane system's, and the rank threshold applies to them.
pub fn solve_lindstrom_fast(
    samples: &[GradientSample],
    isovalue: f64,
    mass_point: [f64; 3],
    config: &SvdConfig,
) -> Result<ReconstructedPoint, SolveError> {
    if samples.is_empty() {
        return Err(SolveError::NoSamples);
    }

    let mut ata = Matrix3::<f64>::zeros();
    let mut atb = Vector3::<f64>::zeros();
    for s in samples {
        if !(s.weight > 0.0) {
            continue;
        }
        let mag = s.gradient_magnitude();
        if mag <= ZERO_GRADIENT_TOLERANCE {
            continue;
        }
        let n = Vector3::from(s.gradient) / mag;
        let d = (s.scalar - isovalue) / mag - n.dot(&Vector3::from(s.position));
        ata += s.weight * n * n.transpose();
        atb -= s.weight * d * n;
    }

    let dec = RankDecomposition::from_matrix3(&ata, config.error_tolerance, config.max_rank);
    if dec.rank() == 0 {
        return Ok(ReconstructedPoint::fallback(mass_point));
    }

    let m = DVector::from_column_slice(&mass_point);
    let b = DVector::from_column_slice(atb.as_slice());
    let dx = dec.pseudo_inverse() * (b - dec.truncated_matrix() * &m);
    Ok(offset_result(&dec, mass_point, [dx[0], dx[1], dx[2]]))
}

/// Lindstrom solve from isosurface-edge intersection points and normals.
///
/// Each pair becomes a sample whose scalar equals the isovalue; the mass
/// point is the centroid of the points. `config.method` picks the variant
/// ([`SolveMethod::Direct`] is treated as [`SolveMethod::Lindstrom`]).
pub fn solve_edge_intersections(
    intersections: &[([f64; 3], [f64; 3])],
    isovalue: f64,
    config: &SvdConfig,
) -> Result<ReconstructedPoint, SolveError> {
    let samples: Vec<GradientSample> = intersections
        .iter()
        .map(|&(p, n)| GradientSample::new(p, n, isovalue))
        .collect();
    let Some(mass_point) = weighted_centroid(&samples) else {
        return Err(SolveError::NoSamples);
    };
    match config.method {
        SolveMethod::LindstromFast => solve_lindstrom_fast(&samples, isovalue, mass_point, config),
        SolveMethod::Lindstrom2 => {
            solve_lindstrom_truncated(&samples, isovalue, mass_point, config)
        }
        SolveMethod::Direct | SolveMethod::Lindstrom => {
            solve_lindstrom(&samples, isovalue, mass_point, config)
        }
    }
}

fn offset_result(dec: &RankDecomposition, m: [f64; 3], dx: [f64; 3]) -> ReconstructedPoint {
    ReconstructedPoint {
        coord: [m[0] + dx[0], m[1] + dx[1], m[2] + dx[2]],
        singular_values: dec.retained_singular_values(),
        rank: dec.rank(),
        free_direction: dec.free_direction(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svd::solve_direct;
    use approx::assert_relative_eq;
    use rand::prelude::*;

    fn noisy_corner_samples(rng: &mut StdRng, corner: [f64; 3], n: usize) -> Vec<GradientSample> {
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let axis = i % 3;
            let mut g = [0.0; 3];
            g[axis] = 1.0;
            // tilt the normal slightly so the system is overdetermined
            g[(axis + 1) % 3] = rng.gen_range(-0.05..0.05);
            let p = [rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()];
            let offset = [p[0] - corner[0], p[1] - corner[1], p[2] - corner[2]];
            let s = g[0] * offset[0] + g[1] * offset[1] + g[2] * offset[2];
            out.push(GradientSample::new(p, g, s + rng.gen_range(-1e-3..1e-3)));
        }
        out
    }

    #[test]
    fn full_rank_matches_direct_solution() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = noisy_corner_samples(&mut rng, [0.3, 0.6, 0.4], 24);
        let cfg = SvdConfig::default();
        let direct = solve_direct(&samples, 0.0, [0.5; 3], &cfg).expect("non-empty");
        assert_eq!(direct.rank, 3);
        for m in [[0.5; 3], [0.0, 1.0, 0.2]] {
            let lind = solve_lindstrom(&samples, 0.0, m, &cfg).expect("non-empty");
            let trunc = solve_lindstrom_truncated(&samples, 0.0, m, &cfg).expect("non-empty");
            assert_eq!(lind.rank, 3);
            for d in 0..3 {
                assert_relative_eq!(lind.coord[d], direct.coord[d], epsilon = 1e-9);
                assert_relative_eq!(trunc.coord[d], direct.coord[d], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn fast_variant_solves_normal_equations() {
        let mut rng = StdRng::seed_from_u64(11);
        let samples = noisy_corner_samples(&mut rng, [0.7, 0.2, 0.5], 30);
        let cfg = SvdConfig {
            error_tolerance: 1e-3,
            ..SvdConfig::default()
        };
        let direct = solve_direct(&samples, 0.0, [0.5; 3], &cfg).expect("non-empty");
        let fast = solve_lindstrom_fast(&samples, 0.0, [0.5; 3], &cfg).expect("non-empty");
        assert_eq!(fast.rank, 3);
        for d in 0..3 {
            assert_relative_eq!(fast.coord[d], direct.coord[d], epsilon = 1e-8);
            // singular values of AᵗA are squares of those of A
            assert_relative_eq!(
                fast.singular_values[d],
                direct.singular_values[d].powi(2),
                epsilon = 1e-8
            );
        }
    }

    #[test]
    fn edge_keeps_mass_point_along_free_direction() {
        let samples = vec![
            GradientSample::new([0.25, 0.1, 0.0], [1.0, 0.0, 0.0], 0.0),
            GradientSample::new([0.9, 0.75, 1.0], [0.0, 1.0, 0.0], 0.0),
        ];
        let m = [0.5, 0.5, 0.35];
        let cfg = SvdConfig::default();
        for r in [
            solve_lindstrom(&samples, 0.0, m, &cfg),
            solve_lindstrom_truncated(&samples, 0.0, m, &cfg),
            solve_lindstrom_fast(&samples, 0.0, m, &cfg),
        ] {
            let r = r.expect("non-empty");
            assert_eq!(r.rank, 2);
            assert_relative_eq!(r.coord[0], 0.25, epsilon = 1e-12);
            assert_relative_eq!(r.coord[1], 0.75, epsilon = 1e-12);
            assert_relative_eq!(r.coord[2], 0.35, epsilon = 1e-12);
            let dir = r.free_direction.expect("rank 2");
            assert_relative_eq!(dir[2].abs(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rank_zero_returns_mass_point() {
        let samples = vec![GradientSample::new([0.0; 3], [0.0, 0.0, 0.0], 1.0)];
        let m = [1.5, 2.5, 3.5];
        let cfg = SvdConfig::default();
        let a = solve_lindstrom(&samples, 0.0, m, &cfg).expect("non-empty");
        let b = solve_lindstrom_fast(&samples, 0.0, m, &cfg).expect("non-empty");
        assert_eq!(a, ReconstructedPoint::fallback(m));
        assert_eq!(b, ReconstructedPoint::fallback(m));
    }

    #[test]
    fn empty_input_is_an_error() {
        let cfg = SvdConfig::default();
        assert_eq!(
            solve_lindstrom(&[], 0.0, [0.5; 3], &cfg),
            Err(SolveError::NoSamples)
        );
        assert_eq!(
            solve_lindstrom_fast(&[], 0.0, [0.5; 3], &cfg),
            Err(SolveError::NoSamples)
        );
        assert_eq!(
            solve_edge_intersections(&[], 0.0, &cfg),
            Err(SolveError::NoSamples)
        );
    }

    #[test]
    fn edge_intersections_recover_corner() {
        let corner = [0.4, 0.45, 0.6];
        let mut pairs = Vec::new();
        for axis in 0..3 {
            let mut n = [0.0; 3];
            n[axis] = 2.0;
            for t in [0.1, 0.9] {
                let mut p = [t; 3];
                p[axis] = corner[axis];
                pairs.push((p, n));
            }
        }
        for method in [
            SolveMethod::Lindstrom,
            SolveMethod::Lindstrom2,
            SolveMethod::LindstromFast,
        ] {
            let cfg = SvdConfig {
                method,
                ..SvdConfig::default()
            };
            let r = solve_edge_intersections(&pairs, 0.0, &cfg).expect("non-empty");
            assert_eq!(r.rank, 3, "{method:?}");
            for d in 0..3 {
                assert_relative_eq!(r.coord[d], corner[d], epsilon = 1e-12);
            }
        }
    }
}
