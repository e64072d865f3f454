//! Plane system `A x = B` built from gradient samples.
//!
//! Each sample contributes the isoplane `g·x = isovalue − s + g·p`.

use nalgebra::{DMatrix, DVector};

use crate::sample::{dot, GradientSample, ZERO_GRADIENT_TOLERANCE};

/// Stacked plane equations, one row per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    /// `n × 3` matrix of (possibly normalized) gradients.
    pub a: DMatrix<f64>,
    /// Right-hand side, one entry per row of `a`.
    pub b: DVector<f64>,
}

impl LinearSystem {
    /// Build the system for `samples`.
    ///
    /// With `normalize`, each row is divided by the gradient magnitude and
    /// rows with magnitude `<= ZERO_GRADIENT_TOLERANCE` are zeroed. Every row
    /// is then scaled by `sqrt(weight)`; non-positive weights zero the row.
    pub fn from_samples(samples: &[GradientSample], isovalue: f64, normalize: bool) -> Self {
        let n = samples.len();
        let mut a = DMatrix::<f64>::zeros(n, 3);
        let mut b = DVector::<f64>::zeros(n);

        for (i, s) in samples.iter().enumerate() {
            let g = s.gradient;
            let mut scale = if s.weight > 0.0 { s.weight.sqrt() } else { 0.0 };
            if normalize {
                let mag = s.gradient_magnitude();
                if mag <= ZERO_GRADIENT_TOLERANCE {
                    continue;
                }
                scale /= mag;
            }
            for d in 0..3 {
                a[(i, d)] = g[d] * scale;
            }
            b[i] = (isovalue - s.scalar + dot(g, s.position)) * scale;
        }
        Self { a, b }
    }

    /// Number of plane equations.
    pub fn num_rows(&self) -> usize {
        self.a.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn raw_rows_keep_gradient_length() {
        let s = GradientSample::new([1.0, 2.0, 3.0], [0.0, 2.0, 0.0], 1.0);
        let sys = LinearSystem::from_samples(&[s], 0.5, false);
        assert_eq!(sys.num_rows(), 1);
        assert_eq!(sys.a[(0, 1)], 2.0);
        // 0.5 - 1 + 2 * 2
        assert_relative_eq!(sys.b[0], 3.5);
    }

    #[test]
    fn normalized_rows_are_unit_length() {
        let s = GradientSample::new([1.0, 2.0, 3.0], [0.0, 2.0, 0.0], 1.0);
        let sys = LinearSystem::from_samples(&[s], 0.5, true);
        assert_relative_eq!(sys.a[(0, 1)], 1.0);
        assert_relative_eq!(sys.b[0], 1.75);
    }

    #[test]
    fn tiny_gradients_give_zero_rows_when_normalized() {
        let s = GradientSample::new([1.0, 2.0, 3.0], [0.0, 5e-5, 0.0], 1.0);
        let sys = LinearSystem::from_samples(&[s], 0.5, true);
        assert_eq!(sys.a.row(0).iter().copied().collect::<Vec<_>>(), vec![0.0; 3]);
        assert_eq!(sys.b[0], 0.0);
    }

    #[test]
    fn weight_scales_by_square_root() {
        let s = GradientSample::new([0.0; 3], [1.0, 0.0, 0.0], -0.3).with_weight(4.0);
        let sys = LinearSystem::from_samples(&[s], 0.0, true);
        assert_relative_eq!(sys.a[(0, 0)], 2.0);
        assert_relative_eq!(sys.b[0], 0.6);
    }
}
