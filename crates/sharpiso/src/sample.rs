//! Gradient samples: a position, the gradient there and the scalar value.

use serde::{Deserialize, Serialize};

/// Gradients at or below this magnitude carry no direction and are treated
/// as zero by the solvers.
pub const ZERO_GRADIENT_TOLERANCE: f64 = 1e-4;

fn unit_weight() -> f64 {
    1.0
}

/// One observation of the scalar field near a cube.
///
/// The sample defines an isoplane `{x : scalar + gradient·(x − position) = isovalue}`.
/// `weight` is the sample's multiplicity in the least-squares system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientSample {
    /// Position in grid space.
    pub position: [f64; 3],
    /// Gradient at `position`.
    pub gradient: [f64; 3],
    /// Scalar value at `position`.
    pub scalar: f64,
    /// Multiplicity in the least-squares system (1 by default).
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

impl GradientSample {
    /// Sample with unit weight.
    pub fn new(position: [f64; 3], gradient: [f64; 3], scalar: f64) -> Self {
        Self {
            position,
            gradient,
            scalar,
            weight: 1.0,
        }
    }

    /// Same sample with multiplicity `weight`.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Squared gradient length, compared against the magnitude threshold.
    pub fn gradient_magnitude_squared(&self) -> f64 {
        dot(self.gradient, self.gradient)
    }

    /// Euclidean length of the gradient.
    pub fn gradient_magnitude(&self) -> f64 {
        self.gradient_magnitude_squared().sqrt()
    }

    /// Linear extrapolation of the field to `point`: `s + g·(point − p)`.
    #[inline]
    pub fn isoplane_value(&self, point: [f64; 3]) -> f64 {
        let d = [
            point[0] - self.position[0],
            point[1] - self.position[1],
            point[2] - self.position[2],
        ];
        self.scalar + dot(self.gradient, d)
    }

    /// Euclidean distance from `point` to the sample's isoplane.
    ///
    /// `None` when the gradient is too small to define a plane.
    pub fn isoplane_distance(&self, point: [f64; 3], isovalue: f64) -> Option<f64> {
        let mag = self.gradient_magnitude();
        if mag <= ZERO_GRADIENT_TOLERANCE {
            return None;
        }
        Some((self.isoplane_value(point) - isovalue).abs() / mag)
    }
}

#[inline]
pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Weighted centroid of the sample positions.
///
/// Samples with non-positive weight are ignored; `None` if nothing remains.
pub fn weighted_centroid(samples: &[GradientSample]) -> Option<[f64; 3]> {
    let mut sum = [0.0; 3];
    let mut total = 0.0;
    for s in samples.iter().filter(|s| s.weight > 0.0) {
        for d in 0..3 {
            sum[d] += s.weight * s.position[d];
        }
        total += s.weight;
    }
    if total <= 0.0 {
        return None;
    }
    Some([sum[0] / total, sum[1] / total, sum[2] / total])
}

/// Sort samples by decreasing distance from `point` to their isoplane.
///
/// Samples without a well-defined plane sort last. The sort is stable.
pub fn sort_by_isoplane_distance(samples: &mut [GradientSample], point: [f64; 3], isovalue: f64) {
    samples.sort_by(|a, b| {
        let da = a.isoplane_distance(point, isovalue).unwrap_or(-1.0);
        let db = b.isoplane_distance(point, isovalue).unwrap_or(-1.0);
        db.total_cmp(&da)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn isoplane_distance_scales_with_gradient() {
        let s = GradientSample::new([1.0, 1.0, 1.0], [0.0, 0.0, 2.0], 3.0);
        // plane: 3 + 2 (z - 1) = 0 -> z = -0.5
        let d = s.isoplane_distance([5.0, -2.0, 1.5], 0.0).expect("plane exists");
        assert_relative_eq!(d, 2.0, epsilon = 1e-12);
        let flat = GradientSample::new([0.0; 3], [0.0, 0.0, 1e-6], 0.0);
        assert!(flat.isoplane_distance([0.0; 3], 0.0).is_none());
    }

    #[test]
    fn centroid_honors_weights() {
        let samples = [
            GradientSample::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.0).with_weight(3.0),
            GradientSample::new([4.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.0),
            GradientSample::new([100.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.0).with_weight(0.0),
        ];
        let c = weighted_centroid(&samples).expect("non-empty");
        assert_relative_eq!(c[0], 1.0, epsilon = 1e-12);
        assert!(weighted_centroid(&[]).is_none());
    }

    #[test]
    fn sorts_farthest_plane_first() {
        let mut samples = vec![
            GradientSample::new([0.0; 3], [1.0, 0.0, 0.0], 0.1),
            GradientSample::new([0.0; 3], [0.0; 3], 0.0),
            GradientSample::new([0.0; 3], [0.0, 1.0, 0.0], 0.7),
            GradientSample::new([0.0; 3], [0.0, 0.0, 1.0], 0.3),
        ];
        sort_by_isoplane_distance(&mut samples, [0.0; 3], 0.0);
        let scalars: Vec<f64> = samples.iter().map(|s| s.scalar).collect();
        assert_eq!(scalars, vec![0.7, 0.3, 0.1, 0.0]);
    }

    #[test]
    fn weight_defaults_to_one_when_deserializing() {
        let s: GradientSample =
            serde_json::from_str(r#"{"position":[0,0,0],"gradient":[1,0,0],"scalar":0.5}"#)
                .expect("valid json");
        assert_eq!(s.weight, 1.0);
    }
}
