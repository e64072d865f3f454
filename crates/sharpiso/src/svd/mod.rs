//! Rank-aware least-squares intersection of gradient isoplanes.
//!
//! Every sample defines the plane `g·x = isovalue − s + g·p`. The planes are
//! stacked into `A x = B` and solved with a truncated SVD pseudo-inverse:
//! singular values at or below `error_tolerance · σ_max` are dropped, so
//! near-parallel normals do not throw the point away from the samples.
//!
//! The retained rank classifies the feature: 3 = corner, 2 = edge (with the
//! free direction reported), 1 = smooth, 0 = no information.

mod decomposition;
mod direct;
mod lindstrom;
mod solver;
mod system;
mod types;

pub use decomposition::RankDecomposition;
pub use direct::{solve_direct, solve_sharp_point};
pub use lindstrom::{
    solve_edge_intersections, solve_lindstrom, solve_lindstrom_fast, solve_lindstrom_truncated,
};
pub use solver::SvdSolver;
pub use system::LinearSystem;
pub use types::{FeatureKind, MassPoint, ReconstructedPoint, SolveError, SolveMethod, SvdConfig};
