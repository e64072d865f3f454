//! Cube expanded (or shrunk) by a fixed offset, used to test whether a
//! sample's isoplane passes near a cube.

use crate::config::ConfigError;
use crate::grid::{corner_offset, NUM_CUBE_VERTICES};
use crate::sample::GradientSample;

/// Axis-aligned box `[c − offset, c + 1 + offset]³` around the unit cube with
/// lowest corner `c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetCube {
    offset: f64,
}

impl OffsetCube {
    /// `offset` must lie in `(-1, 1]`; at `-1` the box would have negative size.
    pub fn new(offset: f64) -> Result<Self, ConfigError> {
        if !offset.is_finite() || offset <= -1.0 || offset > 1.0 {
            return Err(ConfigError::IllFormedOffset { value: offset });
        }
        Ok(Self { offset })
    }

    /// Outward offset per side, in grid units.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Edge length of the box.
    pub fn edge_length(&self) -> f64 {
        1.0 + 2.0 * self.offset
    }

    /// Box corners in cube-corner order.
    pub fn corners(&self, cube_coord: [usize; 3]) -> [[f64; 3]; NUM_CUBE_VERTICES] {
        let edge = self.edge_length();
        let origin = [
            cube_coord[0] as f64 - self.offset,
            cube_coord[1] as f64 - self.offset,
            cube_coord[2] as f64 - self.offset,
        ];
        std::array::from_fn(|k| {
            let o = corner_offset(k);
            [
                origin[0] + o[0] as f64 * edge,
                origin[1] + o[1] as f64 * edge,
                origin[2] + o[2] as f64 * edge,
            ]
        })
    }

    /// True if the sample's isoplane meets the box.
    ///
    /// The linear extrapolation is evaluated at the eight corners; the plane
    /// misses the box only when all corners lie strictly on one side.
    pub fn isoplane_intersects(
        &self,
        cube_coord: [usize; 3],
        sample: &GradientSample,
        isovalue: f64,
    ) -> bool {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for corner in self.corners(cube_coord) {
            let s = sample.isoplane_value(corner);
            lo = lo.min(s);
            hi = hi.max(s);
        }
        lo <= isovalue && isovalue <= hi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_offsets_outside_range() {
        assert!(OffsetCube::new(-1.0).is_err());
        assert!(OffsetCube::new(1.5).is_err());
        assert!(OffsetCube::new(f64::INFINITY).is_err());
        assert!(OffsetCube::new(1.0).is_ok());
        assert!(OffsetCube::new(-0.5).is_ok());
    }

    #[test]
    fn corners_span_offset_box() {
        let cube = OffsetCube::new(0.25).expect("valid offset");
        let c = cube.corners([2, 3, 4]);
        assert_eq!(c[0], [1.75, 2.75, 3.75]);
        assert_relative_eq!(c[7][0], 3.25);
        assert_relative_eq!(c[7][1], 4.25);
        assert_relative_eq!(c[7][2], 5.25);
        assert_eq!(c[1][1], c[0][1]);
        assert_relative_eq!(c[1][0], 3.25);
    }

    #[test]
    fn plane_through_cube_intersects() {
        let cube = OffsetCube::new(0.0).expect("valid offset");
        // plane x = 2.5 through the cube [2,3]^3
        let s = GradientSample::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], -2.5);
        assert!(cube.isoplane_intersects([2, 2, 2], &s, 0.0));
        assert!(!cube.isoplane_intersects([4, 2, 2], &s, 0.0));
    }

    #[test]
    fn plane_touching_a_face_counts_as_intersecting() {
        let cube = OffsetCube::new(0.0).expect("valid offset");
        // plane x = 3 is the upper x face of [2,3]^3
        let s = GradientSample::new([3.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.0);
        assert!(cube.isoplane_intersects([2, 2, 2], &s, 0.0));
    }

    #[test]
    fn offset_widens_the_test_region() {
        // plane x = 3.4 misses [2,3]^3 but meets [1.5, 3.5]^3
        let s = GradientSample::new([3.4, 0.0, 0.0], [1.0, 0.0, 0.0], 0.0);
        let tight = OffsetCube::new(0.0).expect("valid offset");
        let wide = OffsetCube::new(0.5).expect("valid offset");
        assert!(!tight.isoplane_intersects([2, 2, 2], &s, 0.0));
        assert!(wide.isoplane_intersects([2, 2, 2], &s, 0.0));
        let narrow = OffsetCube::new(-0.4).expect("valid offset");
        let s = GradientSample::new([2.2, 0.0, 0.0], [1.0, 0.0, 0.0], 0.0);
        assert!(tight.isoplane_intersects([2, 2, 2], &s, 0.0));
        assert!(!narrow.isoplane_intersects([2, 2, 2], &s, 0.0));
    }
}
