//! Regular 3D grid topology with a scalar and a gradient per vertex.
//!
//! Vertices are indexed with x varying fastest. A cube is identified by the
//! index of its lowest corner. Corner `k` of a cube sits at offset
//! `(k & 1, (k >> 1) & 1, (k >> 2) & 1)` from that corner.
//!
//! Positions are expressed in grid space with unit spacing, so the vertex
//! with coordinate `(i, j, k)` sits at `(i, j, k)` and the cube with lowest
//! corner `(i, j, k)` spans `[i, i+1] × [j, j+1] × [k, k+1]`.

mod field;
mod gradient;

pub use field::{GridError, ScalarGrid, ScalarGridSpec, GRID_SCHEMA};
pub use gradient::central_difference_gradients;

/// Number of cube corners.
pub const NUM_CUBE_VERTICES: usize = 8;
/// Number of vertices on one cube facet.
pub const NUM_CUBE_FACET_VERTICES: usize = 4;
/// Number of cube edges.
pub const NUM_CUBE_EDGES: usize = 12;

/// Read-only access to a regular grid carrying one scalar and one gradient
/// per vertex.
///
/// Implementors only supply storage access; the index arithmetic is shared.
pub trait GridField {
    /// Number of vertices along x, y and z.
    fn axis_size(&self) -> [usize; 3];
    /// Scalar value at vertex `iv`.
    fn scalar(&self, iv: usize) -> f64;
    /// Gradient at vertex `iv`.
    fn gradient(&self, iv: usize) -> [f64; 3];

    /// Total number of grid vertices.
    fn num_vertices(&self) -> usize {
        let [nx, ny, nz] = self.axis_size();
        nx * ny * nz
    }

    /// Index distance between neighbors along each axis.
    fn axis_increment(&self) -> [usize; 3] {
        let [nx, ny, _] = self.axis_size();
        [1, nx, nx * ny]
    }

    /// Integer coordinate of vertex `iv`.
    fn vertex_coord(&self, iv: usize) -> [usize; 3] {
        let [nx, ny, _] = self.axis_size();
        [iv % nx, (iv / nx) % ny, iv / (nx * ny)]
    }

    /// Index of the vertex at `coord`.
    fn vertex_index(&self, coord: [usize; 3]) -> usize {
        let inc = self.axis_increment();
        coord[0] * inc[0] + coord[1] * inc[1] + coord[2] * inc[2]
    }

    /// Position of vertex `iv` in grid space.
    fn vertex_position(&self, iv: usize) -> [f64; 3] {
        let c = self.vertex_coord(iv);
        [c[0] as f64, c[1] as f64, c[2] as f64]
    }

    /// Squared length of the gradient at vertex `iv`.
    fn gradient_magnitude_squared(&self, iv: usize) -> f64 {
        let g = self.gradient(iv);
        g[0] * g[0] + g[1] * g[1] + g[2] * g[2]
    }

    /// True if `cube_index` is the lowest corner of a cube inside the grid.
    fn is_cube(&self, cube_index: usize) -> bool {
        if cube_index >= self.num_vertices() {
            return false;
        }
        let size = self.axis_size();
        let c = self.vertex_coord(cube_index);
        (0..3).all(|d| c[d] + 1 < size[d])
    }

    /// Number of cubes (`(nx-1)(ny-1)(nz-1)`).
    fn num_cubes(&self) -> usize {
        let [nx, ny, nz] = self.axis_size();
        nx.saturating_sub(1) * ny.saturating_sub(1) * nz.saturating_sub(1)
    }

    /// Cube indices in ascending order.
    fn cube_indices(&self) -> Vec<usize> {
        let [nx, ny, nz] = self.axis_size();
        let mut out = Vec::with_capacity(self.num_cubes());
        for z in 0..nz.saturating_sub(1) {
            for y in 0..ny.saturating_sub(1) {
                for x in 0..nx.saturating_sub(1) {
                    out.push(self.vertex_index([x, y, z]));
                }
            }
        }
        out
    }

    /// Center of the cube in grid space.
    fn cube_center(&self, cube_index: usize) -> [f64; 3] {
        let p = self.vertex_position(cube_index);
        [p[0] + 0.5, p[1] + 0.5, p[2] + 0.5]
    }

    /// Grid vertex at corner `corner` (0..8) of the cube.
    fn cube_vertex(&self, cube_index: usize, corner: usize) -> usize {
        let inc = self.axis_increment();
        let o = corner_offset(corner);
        cube_index + o[0] * inc[0] + o[1] * inc[1] + o[2] * inc[2]
    }

    /// Vertex `k` (0..4) of the lower cube facet orthogonal to `orth_axis`.
    fn facet_vertex(&self, cube_index: usize, orth_axis: usize, k: usize) -> usize {
        let inc = self.axis_increment();
        let d1 = (orth_axis + 1) % 3;
        let d2 = (orth_axis + 2) % 3;
        cube_index + (k & 1) * inc[d1] + ((k >> 1) & 1) * inc[d2]
    }

    /// True if any of the 12 cube edges is bipolar.
    fn is_active_cube(&self, cube_index: usize, isovalue: f64) -> bool {
        let inc = self.axis_increment();
        (0..3).any(|d| {
            (0..NUM_CUBE_FACET_VERTICES).any(|k| {
                let iv0 = self.facet_vertex(cube_index, d, k);
                is_bipolar(self.scalar(iv0), self.scalar(iv0 + inc[d]), isovalue)
            })
        })
    }
}

/// Offset of cube corner `corner` from the lowest corner.
pub fn corner_offset(corner: usize) -> [usize; 3] {
    [corner & 1, (corner >> 1) & 1, (corner >> 2) & 1]
}

/// Cube corner index of facet vertex `k` on the lower facet orthogonal to `orth_axis`.
pub fn facet_corner(orth_axis: usize, k: usize) -> usize {
    let d1 = (orth_axis + 1) % 3;
    let d2 = (orth_axis + 2) % 3;
    ((k & 1) << d1) | (((k >> 1) & 1) << d2)
}

/// An edge is bipolar when one endpoint is below the isovalue and the other
/// is at or above it.
#[inline]
pub fn is_bipolar(s0: f64, s1: f64, isovalue: f64) -> bool {
    let (lo, hi) = if s0 < s1 { (s0, s1) } else { (s1, s0) };
    lo < isovalue && isovalue <= hi
}
