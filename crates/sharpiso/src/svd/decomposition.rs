//! Rank-truncated SVD of the plane system.
//!
//! Singular values are sorted in descending order and `σ_i` is retained iff
//! `σ_i > error_tolerance · σ_max`, up to `max_rank` values. The pseudo-inverse
//! and the reconstructed matrix use only the retained triplets.

use nalgebra::{DMatrix, Matrix3, Vector3};

const SVD_MAX_ITERATIONS: usize = 1000;

/// Projected axis lengths closer than this count as tied.
const AXIS_TIE_TOLERANCE: f64 = 1e-12;

/// Thin SVD `A = U Σ Vᵗ` with a retained rank.
#[derive(Debug, Clone)]
pub struct RankDecomposition {
    /// `n × k` left singular vectors, column `i` pairs with `singular_values[i]`.
    u: DMatrix<f64>,
    /// `3 × k` right singular vectors.
    v: DMatrix<f64>,
    /// Descending, `k = min(n, 3)` entries.
    singular_values: Vec<f64>,
    rank: usize,
}

impl RankDecomposition {
    /// Decompose the `n × 3` matrix `a`.
    ///
    /// Non-finite input or a non-converging SVD yields an empty (rank 0)
    /// decomposition.
    pub fn new(a: &DMatrix<f64>, error_tolerance: f64, max_rank: usize) -> Self {
        let n = a.nrows();
        if a.iter().any(|x| !x.is_finite()) {
            tracing::warn!(rows = n, "non-finite plane system, treating as rank 0");
            return Self::empty(n);
        }
        let Some(svd) = a.clone().try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS) else {
            tracing::warn!(rows = n, "SVD did not converge, treating as rank 0");
            return Self::empty(n);
        };
        let (Some(u_raw), Some(v_t)) = (svd.u, svd.v_t) else {
            return Self::empty(n);
        };

        let k = svd.singular_values.len();
        let mut order: Vec<usize> = (0..k).collect();
        order.sort_by(|&i, &j| svd.singular_values[j].total_cmp(&svd.singular_values[i]));

        let mut u = DMatrix::<f64>::zeros(n, k);
        let mut v = DMatrix::<f64>::zeros(3, k);
        let mut singular_values = Vec::with_capacity(k);
        for (dst, &src) in order.iter().enumerate() {
            singular_values.push(svd.singular_values[src]);
            u.set_column(dst, &u_raw.column(src));
            for r in 0..3 {
                v[(r, dst)] = v_t[(src, r)];
            }
        }

        let rank = retained_rank(&singular_values, error_tolerance, max_rank);
        Self {
            u,
            v,
            singular_values,
            rank,
        }
    }

    /// Decompose a 3×3 matrix (normal equations).
    pub fn from_matrix3(m: &Matrix3<f64>, error_tolerance: f64, max_rank: usize) -> Self {
        let a = DMatrix::from_fn(3, 3, |r, c| m[(r, c)]);
        Self::new(&a, error_tolerance, max_rank)
    }

    fn empty(n: usize) -> Self {
        Self {
            u: DMatrix::zeros(n, 0),
            v: DMatrix::zeros(3, 0),
            singular_values: Vec::new(),
            rank: 0,
        }
    }

    /// Number of retained singular values (0..=3).
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// All singular values, descending.
    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    /// Retained singular values, descending, zero-padded to three entries.
    pub fn retained_singular_values(&self) -> [f64; 3] {
        let mut out = [0.0; 3];
        out[..self.rank].copy_from_slice(&self.singular_values[..self.rank]);
        out
    }

    /// Truncated pseudo-inverse `V Σ_r⁺ Uᵗ` (`3 × n`).
    pub fn pseudo_inverse(&self) -> DMatrix<f64> {
        let n = self.u.nrows();
        let mut pinv = DMatrix::<f64>::zeros(3, n);
        for i in 0..self.rank {
            let inv = 1.0 / self.singular_values[i];
            for r in 0..3 {
                let vr = self.v[(r, i)] * inv;
                for c in 0..n {
                    pinv[(r, c)] += vr * self.u[(c, i)];
                }
            }
        }
        pinv
    }

    /// Rank-truncated reconstruction `U Σ_r Vᵗ` (`n × 3`).
    pub fn truncated_matrix(&self) -> DMatrix<f64> {
        let n = self.u.nrows();
        let mut a = DMatrix::<f64>::zeros(n, 3);
        for i in 0..self.rank {
            let s = self.singular_values[i];
            for r in 0..n {
                let ur = self.u[(r, i)] * s;
                for c in 0..3 {
                    a[(r, c)] += ur * self.v[(c, i)];
                }
            }
        }
        a
    }

    /// Projector onto the null space of the truncated system, `I − A⁺A`.
    pub fn null_projector(&self) -> Matrix3<f64> {
        let mut p = Matrix3::identity();
        for i in 0..self.rank {
            let vi = Vector3::new(self.v[(0, i)], self.v[(1, i)], self.v[(2, i)]);
            p -= vi * vi.transpose();
        }
        p
    }

    /// Unit direction along which a rank-2 system is unconstrained.
    ///
    /// The coordinate axes are projected through `I − A⁺A`; the longest
    /// projection (lowest axis on ties, up to rounding) is normalized.
    /// `None` unless the rank is exactly 2.
    pub fn free_direction(&self) -> Option<[f64; 3]> {
        if self.rank != 2 {
            return None;
        }
        let p = self.null_projector();
        let mut best = p.column(0).into_owned();
        let mut best_norm = best.norm_squared();
        for axis in 1..3 {
            let c = p.column(axis).into_owned();
            let n = c.norm_squared();
            if n > best_norm + AXIS_TIE_TOLERANCE {
                best = c;
                best_norm = n;
            }
        }
        let norm = best_norm.sqrt();
        if !(norm > 0.0) || !norm.is_finite() {
            return None;
        }
        Some([best[0] / norm, best[1] / norm, best[2] / norm])
    }
}

/// Number of leading singular values above `error_tolerance · σ_max`.
fn retained_rank(sorted_desc: &[f64], error_tolerance: f64, max_rank: usize) -> usize {
    let Some(&sigma_max) = sorted_desc.first() else {
        return 0;
    };
    let threshold = error_tolerance * sigma_max;
    if !(threshold > 0.0) {
        return 0;
    }
    sorted_desc
        .iter()
        .take(max_rank)
        .take_while(|&&s| s > threshold)
        .count()
}
