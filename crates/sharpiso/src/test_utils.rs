//! Synthetic scalar grids shared by unit tests.
//!
//! All fields carry analytic gradients so that the expected sharp vertex is
//! known exactly.

use crate::grid::ScalarGrid;

/// `f(p) = gradient·p + offset`.
pub(crate) fn linear_grid(size: [usize; 3], gradient: [f64; 3], offset: f64) -> ScalarGrid {
    ScalarGrid::from_fn_with_gradient(
        size,
        |p| gradient[0] * p[0] + gradient[1] * p[1] + gradient[2] * p[2] + offset,
        |_| gradient,
    )
    .expect("valid test grid")
}

/// `f(p) = normal·(p − point)`: the zero isosurface is the plane through `point`.
pub(crate) fn plane_grid(size: [usize; 3], normal: [f64; 3], point: [f64; 3]) -> ScalarGrid {
    let offset = -(normal[0] * point[0] + normal[1] * point[1] + normal[2] * point[2]);
    linear_grid(size, normal, offset)
}

/// `f(p) = max_d (p_d − apex_d)`: the zero isosurface has a corner at `apex`.
pub(crate) fn corner_grid(size: [usize; 3], apex: [f64; 3]) -> ScalarGrid {
    max_of_axes_grid(size, apex, 3)
}

/// `f(p) = max(x − apex_x, y − apex_y)`: the zero isosurface has an edge
/// along z through `(apex_x, apex_y)`.
pub(crate) fn edge_grid(size: [usize; 3], apex: [f64; 2]) -> ScalarGrid {
    max_of_axes_grid(size, [apex[0], apex[1], 0.0], 2)
}

/// Signed distance to a sphere.
pub(crate) fn sphere_grid(size: [usize; 3], center: [f64; 3], radius: f64) -> ScalarGrid {
    let dist = move |p: [f64; 3]| {
        let d = [p[0] - center[0], p[1] - center[1], p[2] - center[2]];
        (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
    };
    ScalarGrid::from_fn_with_gradient(
        size,
        |p| dist(p) - radius,
        |p| {
            let r = dist(p);
            if r == 0.0 {
                return [0.0; 3];
            }
            [(p[0] - center[0]) / r, (p[1] - center[1]) / r, (p[2] - center[2]) / r]
        },
    )
    .expect("valid test grid")
}

fn max_of_axes_grid(size: [usize; 3], apex: [f64; 3], num_axes: usize) -> ScalarGrid {
    let argmax = move |p: [f64; 3]| {
        let mut best = 0;
        for d in 1..num_axes {
            if p[d] - apex[d] > p[best] - apex[best] {
                best = d;
            }
        }
        best
    };
    ScalarGrid::from_fn_with_gradient(
        size,
        |p| {
            let d = argmax(p);
            p[d] - apex[d]
        },
        |p| {
            let mut g = [0.0; 3];
            g[argmax(p)] = 1.0;
            g
        },
    )
    .expect("valid test grid")
}
