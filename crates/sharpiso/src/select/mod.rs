//! Gradient sample selection around a grid cube.
//!
//! Candidates are enumerated according to [`CandidateSet`], then filtered in
//! order:
//!
//! 1. **Magnitude** – zero gradients and gradients shorter than
//!    `max_small_magnitude` are dropped.
//! 2. **Isoplane** – optionally, samples whose isoplane misses the
//!    [`OffsetCube`] around the query cube are dropped.
//!
//! An empty result is a valid outcome; the solver reports it.

mod candidates;
mod offset_cube;
mod policy;

pub use candidates::{
    bipolar_cube_edges, bipolar_edge_endpoints, cube_edges, cube_neighbor_vertices, cube_vertices,
    determining_endpoint, edge_intersection_determiners, gradient_edge_intersections,
    interpolated_edge_intersections, neighbor_bipolar_edge_endpoints, CubeEdge,
};
pub use offset_cube::OffsetCube;
pub use policy::{CandidateSet, GradSelectionMethod, SelectionPolicy};

use crate::config::ConfigError;
use crate::grid::{GridField, NUM_CUBE_VERTICES};
use crate::sample::GradientSample;

/// Errors returned by [`GradientSelector::select`].
#[derive(Debug, Clone, PartialEq)]
pub enum SelectError {
    /// The index is not the lowest corner of a cube inside the grid.
    CubeOutOfRange {
        /// Offending cube index.
        cube_index: usize,
    },
}

impl std::fmt::Display for SelectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CubeOutOfRange { cube_index } => {
                write!(f, "cube index {} is outside the grid", cube_index)
            }
        }
    }
}

impl std::error::Error for SelectError {}

/// Validated selection policy.
#[derive(Debug, Clone)]
pub struct GradientSelector {
    policy: SelectionPolicy,
    cube: OffsetCube,
}

impl GradientSelector {
    /// Validate `policy` once; selection itself cannot fail on configuration.
    pub fn new(policy: SelectionPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        let cube = OffsetCube::new(policy.grad_selection_cube_offset)?;
        Ok(Self { policy, cube })
    }

    /// The validated policy.
    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Gradient samples for the cube with lowest corner `cube_index`.
    pub fn select<G: GridField + ?Sized>(
        &self,
        grid: &G,
        cube_index: usize,
        isovalue: f64,
    ) -> Result<Vec<GradientSample>, SelectError> {
        if !grid.is_cube(cube_index) {
            return Err(SelectError::CubeOutOfRange { cube_index });
        }
        let cube_coord = grid.vertex_coord(cube_index);
        let mut samples = self.candidates(grid, cube_index, isovalue);

        let min_mag = self.policy.max_small_magnitude;
        samples.retain(|s| is_large_gradient(s.gradient_magnitude_squared(), min_mag));
        if self.policy.filter_by_isoplane {
            samples.retain(|s| self.cube.isoplane_intersects(cube_coord, s, isovalue));
        }
        Ok(samples)
    }

    fn candidates<G: GridField + ?Sized>(
        &self,
        grid: &G,
        cube_index: usize,
        isovalue: f64,
    ) -> Vec<GradientSample> {
        let zero_tol = self.policy.zero_tolerance;
        match self.policy.candidates {
            CandidateSet::CubeVertices => {
                vertex_samples(grid, cube_vertices(grid, cube_index).iter().copied())
            }
            CandidateSet::NeighborVertices => {
                vertex_samples(grid, cube_neighbor_vertices(grid, cube_index))
            }
            CandidateSet::CubeBipolarEndpoints => {
                vertex_samples(grid, bipolar_edge_endpoints(grid, cube_index, isovalue))
            }
            CandidateSet::NeighborBipolarEndpoints => vertex_samples(
                grid,
                neighbor_bipolar_edge_endpoints(grid, cube_index, isovalue),
            ),
            CandidateSet::EdgeIntersectionDeterminers => {
                let det = edge_intersection_determiners(grid, cube_index, isovalue, zero_tol);
                if self.policy.allow_duplicates {
                    weighted_by_occurrence(grid, &det)
                } else {
                    let corners = cube_vertices(grid, cube_index);
                    let flagged = (0..NUM_CUBE_VERTICES)
                        .map(|k| corners[k])
                        .filter(|iv| det.contains(iv));
                    vertex_samples(grid, flagged)
                }
            }
            CandidateSet::EdgeIntersectionsInterpolated => {
                interpolated_edge_intersections(grid, cube_index, isovalue)
            }
            CandidateSet::EdgeIntersectionsFromGradients => {
                gradient_edge_intersections(grid, cube_index, isovalue, zero_tol)
            }
        }
    }
}

/// A gradient is kept when it is non-zero and at least `max_small_magnitude` long.
#[inline]
fn is_large_gradient(mag_squared: f64, max_small_magnitude: f64) -> bool {
    mag_squared > 0.0 && mag_squared >= max_small_magnitude * max_small_magnitude
}

fn vertex_sample<G: GridField + ?Sized>(grid: &G, iv: usize) -> GradientSample {
    GradientSample::new(grid.vertex_position(iv), grid.gradient(iv), grid.scalar(iv))
}

fn vertex_samples<G, I>(grid: &G, vertices: I) -> Vec<GradientSample>
where
    G: GridField + ?Sized,
    I: IntoIterator<Item = usize>,
{
    vertices.into_iter().map(|iv| vertex_sample(grid, iv)).collect()
}

/// One sample per distinct vertex, weighted by its number of occurrences and
/// ordered by first occurrence.
fn weighted_by_occurrence<G: GridField + ?Sized>(grid: &G, vertices: &[usize]) -> Vec<GradientSample> {
    let mut order: Vec<usize> = Vec::with_capacity(vertices.len());
    let mut counts: Vec<u32> = Vec::with_capacity(vertices.len());
    for &iv in vertices {
        match order.iter().position(|&v| v == iv) {
            Some(i) => counts[i] += 1,
            None => {
                order.push(iv);
                counts.push(1);
            }
        }
    }
    order
        .into_iter()
        .zip(counts)
        .map(|(iv, n)| vertex_sample(grid, iv).with_weight(f64::from(n)))
        .collect()
}
