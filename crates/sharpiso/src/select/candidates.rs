//! Candidate vertex enumeration around a cube.
//!
//! Every function here returns vertices in a fixed order so that selection
//! is reproducible: cube corners in corner order, neighbor layers axis by
//! axis, and 4×4×4 block vertices with x varying fastest.

use crate::grid::{
    corner_offset, facet_corner, is_bipolar, GridField, NUM_CUBE_EDGES, NUM_CUBE_FACET_VERTICES,
    NUM_CUBE_VERTICES,
};
use crate::sample::GradientSample;

/// One of the 12 cube edges, oriented along the positive axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeEdge {
    /// Edge direction (0 = x, 1 = y, 2 = z).
    pub axis: usize,
    /// Lower endpoint.
    pub iv0: usize,
    /// Upper endpoint (`iv0` + one step along `axis`).
    pub iv1: usize,
    /// Cube corner index of `iv0`.
    pub corner0: usize,
    /// Cube corner index of `iv1`.
    pub corner1: usize,
}

/// Cube edges in axis-major order.
pub fn cube_edges<G: GridField + ?Sized>(grid: &G, cube_index: usize) -> [CubeEdge; NUM_CUBE_EDGES] {
    let inc = grid.axis_increment();
    std::array::from_fn(|ie| {
        let axis = ie / NUM_CUBE_FACET_VERTICES;
        let k = ie % NUM_CUBE_FACET_VERTICES;
        let iv0 = grid.facet_vertex(cube_index, axis, k);
        let corner0 = facet_corner(axis, k);
        CubeEdge {
            axis,
            iv0,
            iv1: iv0 + inc[axis],
            corner0,
            corner1: corner0 | (1 << axis),
        }
    })
}

/// Cube edges with one endpoint below and one at or above the isovalue.
pub fn bipolar_cube_edges<G: GridField + ?Sized>(
    grid: &G,
    cube_index: usize,
    isovalue: f64,
) -> Vec<CubeEdge> {
    cube_edges(grid, cube_index)
        .into_iter()
        .filter(|e| is_bipolar(grid.scalar(e.iv0), grid.scalar(e.iv1), isovalue))
        .collect()
}

/// The 8 cube corners.
pub fn cube_vertices<G: GridField + ?Sized>(grid: &G, cube_index: usize) -> [usize; NUM_CUBE_VERTICES] {
    std::array::from_fn(|k| grid.cube_vertex(cube_index, k))
}

/// Cube corners, then for each axis the vertex layer below the lower facet
/// and above the upper facet, where those layers exist in the grid.
pub fn cube_neighbor_vertices<G: GridField + ?Sized>(grid: &G, cube_index: usize) -> Vec<usize> {
    let size = grid.axis_size();
    let inc = grid.axis_increment();
    let coord = grid.vertex_coord(cube_index);

    let mut out = Vec::with_capacity(NUM_CUBE_VERTICES + 6 * NUM_CUBE_FACET_VERTICES);
    out.extend_from_slice(&cube_vertices(grid, cube_index));
    for d in 0..3 {
        if coord[d] > 0 {
            for k in 0..NUM_CUBE_FACET_VERTICES {
                out.push(grid.facet_vertex(cube_index, d, k) - inc[d]);
            }
        }
        if coord[d] + 2 < size[d] {
            for k in 0..NUM_CUBE_FACET_VERTICES {
                out.push(grid.facet_vertex(cube_index, d, k) + 2 * inc[d]);
            }
        }
    }
    out
}

/// Per corner: true if the corner is an endpoint of a bipolar cube edge.
pub fn bipolar_corner_flags<G: GridField + ?Sized>(
    grid: &G,
    cube_index: usize,
    isovalue: f64,
) -> [bool; NUM_CUBE_VERTICES] {
    let mut flags = [false; NUM_CUBE_VERTICES];
    for e in bipolar_cube_edges(grid, cube_index, isovalue) {
        flags[e.corner0] = true;
        flags[e.corner1] = true;
    }
    flags
}

/// Endpoints of bipolar cube edges, once each, in corner order.
pub fn bipolar_edge_endpoints<G: GridField + ?Sized>(
    grid: &G,
    cube_index: usize,
    isovalue: f64,
) -> Vec<usize> {
    let flags = bipolar_corner_flags(grid, cube_index, isovalue);
    (0..NUM_CUBE_VERTICES)
        .filter(|&k| flags[k])
        .map(|k| grid.cube_vertex(cube_index, k))
        .collect()
}

const BLOCK: usize = 4;

/// Endpoints of bipolar edges of the cube and of its face-adjacent cubes.
///
/// The cube sits at local position (1,1,1) of a 4×4×4 vertex block; each
/// block vertex is reported at most once, in block order.
pub fn neighbor_bipolar_edge_endpoints<G: GridField + ?Sized>(
    grid: &G,
    cube_index: usize,
    isovalue: f64,
) -> Vec<usize> {
    let size = grid.axis_size();
    let inc = grid.axis_increment();
    let coord = grid.vertex_coord(cube_index);

    let mut flags = [false; BLOCK * BLOCK * BLOCK];
    let mut flag_cube = |cube: usize, origin: [usize; 3]| {
        let corners = bipolar_corner_flags(grid, cube, isovalue);
        for k in 0..NUM_CUBE_VERTICES {
            if !corners[k] {
                continue;
            }
            let o = corner_offset(k);
            let [x, y, z] = [origin[0] + o[0], origin[1] + o[1], origin[2] + o[2]];
            flags[x + BLOCK * y + BLOCK * BLOCK * z] = true;
        }
    };

    flag_cube(cube_index, [1, 1, 1]);
    for d in 0..3 {
        if coord[d] > 0 {
            let mut origin = [1, 1, 1];
            origin[d] = 0;
            flag_cube(cube_index - inc[d], origin);
        }
        if coord[d] + 2 < size[d] {
            let mut origin = [1, 1, 1];
            origin[d] = 2;
            flag_cube(cube_index + inc[d], origin);
        }
    }

    (0..flags.len())
        .filter(|&iw| flags[iw])
        .map(|iw| {
            let local = [iw % BLOCK, (iw / BLOCK) % BLOCK, iw / (BLOCK * BLOCK)];
            // local 0 is only flagged when the cube has a lower neighbor
            grid.vertex_index([
                coord[0] + local[0] - 1,
                coord[1] + local[1] - 1,
                coord[2] + local[2] - 1,
            ])
        })
        .collect()
}

/// Endpoint of `edge` whose tangent line governs where the isosurface
/// crosses the edge.
///
/// The tangent lines of both endpoints (restricted to the edge direction)
/// meet at a kink with value `s2`. The crossing lies on the segment of the
/// endpoint whose side of the kink contains the isovalue. Nearly parallel
/// tangent lines select the lower endpoint.
pub fn determining_endpoint<G: GridField + ?Sized>(
    grid: &G,
    edge: &CubeEdge,
    isovalue: f64,
    zero_tolerance: f64,
) -> usize {
    let s0 = grid.scalar(edge.iv0);
    let s1 = grid.scalar(edge.iv1);
    let g0 = grid.gradient(edge.iv0)[edge.axis];
    let g1 = grid.gradient(edge.iv1)[edge.axis];

    let gdiff = g0 - g1;
    if gdiff.abs() <= zero_tolerance {
        return edge.iv0;
    }
    let t = (s1 - s0 - g1) / gdiff;
    let s2 = g0 * t + s0;

    let below_kink = isovalue < s2;
    match (s0 <= s1, below_kink) {
        (true, true) | (false, false) => edge.iv0,
        (true, false) | (false, true) => edge.iv1,
    }
}

/// Determining endpoint of every bipolar cube edge, in edge order.
///
/// A vertex appears once per edge it determines.
pub fn edge_intersection_determiners<G: GridField + ?Sized>(
    grid: &G,
    cube_index: usize,
    isovalue: f64,
    zero_tolerance: f64,
) -> Vec<usize> {
    bipolar_cube_edges(grid, cube_index, isovalue)
        .iter()
        .map(|e| determining_endpoint(grid, e, isovalue, zero_tolerance))
        .collect()
}

/// One sample per bipolar cube edge at the linearly interpolated crossing,
/// with the endpoint gradients interpolated the same way.
pub fn interpolated_edge_intersections<G: GridField + ?Sized>(
    grid: &G,
    cube_index: usize,
    isovalue: f64,
) -> Vec<GradientSample> {
    bipolar_cube_edges(grid, cube_index, isovalue)
        .iter()
        .map(|e| {
            let t = linear_crossing(grid.scalar(e.iv0), grid.scalar(e.iv1), isovalue);
            let g0 = grid.gradient(e.iv0);
            let g1 = grid.gradient(e.iv1);
            let gradient = [
                (1.0 - t) * g0[0] + t * g1[0],
                (1.0 - t) * g0[1] + t * g1[1],
                (1.0 - t) * g0[2] + t * g1[2],
            ];
            GradientSample::new(point_on_edge(grid, e, t), gradient, isovalue)
        })
        .collect()
}

/// One sample per bipolar cube edge at the crossing predicted by the
/// determining endpoint's gradient, carrying that endpoint's gradient.
///
/// Falls back to linear interpolation when the gradient has no component
/// along the edge. The crossing is clamped to the edge.
pub fn gradient_edge_intersections<G: GridField + ?Sized>(
    grid: &G,
    cube_index: usize,
    isovalue: f64,
    zero_tolerance: f64,
) -> Vec<GradientSample> {
    bipolar_cube_edges(grid, cube_index, isovalue)
        .iter()
        .map(|e| {
            let iv = determining_endpoint(grid, e, isovalue, zero_tolerance);
            let tv = if iv == e.iv0 { 0.0 } else { 1.0 };
            let gradient = grid.gradient(iv);
            let ga = gradient[e.axis];
            let t = if ga.abs() > zero_tolerance {
                (tv + (isovalue - grid.scalar(iv)) / ga).clamp(0.0, 1.0)
            } else {
                linear_crossing(grid.scalar(e.iv0), grid.scalar(e.iv1), isovalue)
            };
            GradientSample::new(point_on_edge(grid, e, t), gradient, isovalue)
        })
        .collect()
}

/// Parameter in `[0, 1]` where the linear interpolant crosses the isovalue.
/// Bipolar edges always have `s0 != s1`.
fn linear_crossing(s0: f64, s1: f64, isovalue: f64) -> f64 {
    ((isovalue - s0) / (s1 - s0)).clamp(0.0, 1.0)
}

fn point_on_edge<G: GridField + ?Sized>(grid: &G, edge: &CubeEdge, t: f64) -> [f64; 3] {
    let mut p = grid.vertex_position(edge.iv0);
    p[edge.axis] += t;
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ScalarGrid;
    use crate::test_utils::{linear_grid, plane_grid};
    use approx::assert_relative_eq;

    #[test]
    fn cube_edges_connect_adjacent_corners() {
        let g = linear_grid([3, 3, 3], [1.0, 0.0, 0.0], 0.0);
        let edges = cube_edges(&g, 0);
        for (ie, e) in edges.iter().enumerate() {
            assert_eq!(e.axis, ie / 4);
            assert_eq!(g.cube_vertex(0, e.corner0), e.iv0);
            assert_eq!(g.cube_vertex(0, e.corner1), e.iv1);
            assert_eq!(e.corner1 - e.corner0, 1 << e.axis);
        }
    }

    #[test]
    fn interior_cube_has_32_neighbor_vertices() {
        let g = linear_grid([5, 5, 5], [1.0, 0.0, 0.0], 0.0);
        let cube = g.vertex_index([1, 1, 1]);
        let vs = cube_neighbor_vertices(&g, cube);
        assert_eq!(vs.len(), 32);
        let mut sorted = vs.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 32, "no duplicates");
        // first layer after the corners: below the x facet
        assert_eq!(vs[8], g.vertex_index([0, 1, 1]));
        assert_eq!(vs[12], g.vertex_index([3, 1, 1]));
    }

    #[test]
    fn boundary_cube_skips_missing_layers() {
        let g = linear_grid([2, 4, 5], [1.0, 0.0, 0.0], 0.0);
        // x: no layer below (coord 0) and none above (0 + 2 == 2)
        // y: none below, one above; z: none below, one above
        let vs = cube_neighbor_vertices(&g, 0);
        assert_eq!(vs.len(), 8 + 4 + 4);
        assert!(vs.iter().all(|&iv| iv < g.num_vertices()));
    }

    #[test]
    fn bipolar_endpoints_of_axis_aligned_plane() {
        // plane x = 1.5 crosses the four x-edges of the cube at (1,1,1)
        let g = linear_grid([4, 4, 4], [1.0, 0.0, 0.0], -1.5);
        let cube = g.vertex_index([1, 1, 1]);
        assert_eq!(bipolar_edge_endpoints(&g, cube, 0.0), cube_vertices(&g, cube).to_vec());
        let elsewhere = g.vertex_index([0, 1, 1]);
        assert!(bipolar_edge_endpoints(&g, elsewhere, 0.0).is_empty());
    }

    #[test]
    fn neighbor_endpoints_cover_adjacent_cubes_once() {
        // plane x = 1.5: the cube and its y/z neighbors are crossed, x neighbors are not
        let g = linear_grid([4, 4, 4], [1.0, 0.0, 0.0], -1.5);
        let cube = g.vertex_index([1, 1, 1]);
        let vs = neighbor_bipolar_edge_endpoints(&g, cube, 0.0);
        // x in {1, 2}, y in {0..=3}, z in {0..=3} minus the 4 (y,z) corners of the block
        assert_eq!(vs.len(), 2 * (16 - 4));
        assert!(vs.windows(2).all(|w| w[0] < w[1]), "block order is index order");
        for iv in vs {
            let c = g.vertex_coord(iv);
            assert!(c[0] == 1 || c[0] == 2);
        }
    }

    #[test]
    fn determining_endpoint_follows_tangent_kink() {
        // s0 = 0, s1 = 1 along x; steep gradient at iv0 reaches iso first
        let scalars = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let mut gradients = vec![[0.0; 3]; 8];
        for iv in 0..8 {
            gradients[iv] = if iv % 2 == 0 { [4.0, 0.0, 0.0] } else { [0.1, 0.0, 0.0] };
        }
        let g = ScalarGrid::new([2, 2, 2], scalars, gradients).expect("valid grid");
        let e = cube_edges(&g, 0)[0];
        // kink at t = (1 - 0 - 0.1) / 3.9, s2 = 4 t ~= 0.923
        assert_eq!(determining_endpoint(&g, &e, 0.5, 1e-7), e.iv0);
        assert_eq!(determining_endpoint(&g, &e, 0.95, 1e-7), e.iv1);
    }

    #[test]
    fn determining_endpoint_with_equal_slopes_is_lower() {
        let g = linear_grid([2, 2, 2], [1.0, 0.0, 0.0], -0.5);
        let e = cube_edges(&g, 0)[0];
        assert_eq!(determining_endpoint(&g, &e, 0.0, 1e-7), e.iv0);
    }

    #[test]
    fn determiners_report_one_entry_per_bipolar_edge() {
        let g = plane_grid([4, 4, 4], [1.0, 1.0, 0.0], [1.6, 1.3, 0.0]);
        let cube = g.vertex_index([1, 1, 1]);
        let edges = bipolar_cube_edges(&g, cube, 0.0);
        let det = edge_intersection_determiners(&g, cube, 0.0, 1e-7);
        assert_eq!(det.len(), edges.len());
        for (iv, e) in det.iter().zip(&edges) {
            assert!(*iv == e.iv0 || *iv == e.iv1);
        }
    }

    #[test]
    fn interpolated_intersections_lie_on_the_plane() {
        let g = plane_grid([4, 4, 4], [1.0, 2.0, -1.0], [1.4, 1.5, 1.6]);
        let cube = g.vertex_index([1, 1, 1]);
        let samples = interpolated_edge_intersections(&g, cube, 0.0);
        assert!(!samples.is_empty());
        for s in &samples {
            // linear field: value at the crossing is the isovalue
            let v = 1.0 * (s.position[0] - 1.4) + 2.0 * (s.position[1] - 1.5)
                - (s.position[2] - 1.6);
            assert_relative_eq!(v, 0.0, epsilon = 1e-12);
            assert_eq!(s.scalar, 0.0);
            assert_relative_eq!(s.gradient[1], 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn gradient_intersections_match_linear_field() {
        let g = plane_grid([4, 4, 4], [0.5, 1.0, 0.0], [1.2, 1.7, 0.0]);
        let cube = g.vertex_index([1, 1, 1]);
        let a = gradient_edge_intersections(&g, cube, 0.0, 1e-7);
        let b = interpolated_edge_intersections(&g, cube, 0.0);
        assert_eq!(a.len(), b.len());
        for (sa, sb) in a.iter().zip(&b) {
            for d in 0..3 {
                assert_relative_eq!(sa.position[d], sb.position[d], epsilon = 1e-12);
            }
        }
    }
}
