//! sharpiso — sharp-feature isosurface vertex reconstruction.
//!
//! Dual contouring places one isosurface vertex per grid cube. Placing it at
//! the cube center or the centroid of edge crossings rounds off the creases
//! and corners of the surface. This crate instead intersects the tangent
//! planes defined by nearby gradients. The pipeline stages are:
//!
//! 1. **Select** – enumerate candidate grid vertices (or edge crossings)
//!    around a cube, drop negligible gradients and, optionally, gradients
//!    whose tangent plane misses the cube.
//! 2. **Solve** – intersect the tangent planes in the least-squares sense
//!    with a rank-truncated SVD; the retained rank tells corner (3), edge (2)
//!    and smooth (1) cells apart.
//! 3. **Vertex** – run select → solve per cube, or over every active cube of
//!    a grid in parallel.
//!
//! # Public API
//! - [`SharpVertexLocator`] and [`SharpIsoConfig`] as primary entry points
//! - [`GradientSelector`] / [`SvdSolver`] and the `solve_*` functions for
//!   running the stages separately
//! - [`GridField`] / [`ScalarGrid`] for supplying volume data
//!
//! All positions are in grid space: vertex `(i, j, k)` sits at `(i, j, k)`.

mod config;
mod grid;
mod sample;
mod select;
mod svd;
mod vertex;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{ConfigError, SharpIsoConfig};
pub use grid::{
    central_difference_gradients, corner_offset, facet_corner, is_bipolar, GridError, GridField,
    ScalarGrid, ScalarGridSpec, GRID_SCHEMA, NUM_CUBE_EDGES, NUM_CUBE_FACET_VERTICES,
    NUM_CUBE_VERTICES,
};
pub use sample::{
    sort_by_isoplane_distance, weighted_centroid, GradientSample, ZERO_GRADIENT_TOLERANCE,
};
pub use select::{
    bipolar_cube_edges, bipolar_edge_endpoints, cube_edges, cube_neighbor_vertices, cube_vertices,
    determining_endpoint, edge_intersection_determiners, gradient_edge_intersections,
    interpolated_edge_intersections, neighbor_bipolar_edge_endpoints, CandidateSet, CubeEdge,
    GradSelectionMethod, GradientSelector, OffsetCube, SelectError, SelectionPolicy,
};
pub use svd::{
    solve_direct, solve_edge_intersections, solve_lindstrom, solve_lindstrom_fast,
    solve_lindstrom_truncated, solve_sharp_point, FeatureKind, LinearSystem, MassPoint,
    RankDecomposition, ReconstructedPoint, SolveError, SolveMethod, SvdConfig, SvdSolver,
};
pub use vertex::{CubeVertexRecord, SharpVertex, SharpVertexLocator, VertexError, VertexStats};
