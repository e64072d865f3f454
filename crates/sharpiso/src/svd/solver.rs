use super::direct::solve_direct;
use super::lindstrom::{solve_lindstrom, solve_lindstrom_fast, solve_lindstrom_truncated};
use super::types::{MassPoint, ReconstructedPoint, SolveError, SolveMethod, SvdConfig};
use crate::config::ConfigError;
use crate::sample::{weighted_centroid, GradientSample};

/// Validated solver configuration with method dispatch.
#[derive(Debug, Clone)]
pub struct SvdSolver {
    config: SvdConfig,
}

impl SvdSolver {
    /// Validate `config` once.
    pub fn new(config: SvdConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    pub fn config(&self) -> &SvdConfig {
        &self.config
    }

    /// Solve the samples gathered for the cube centered at `cube_center`.
    ///
    /// The direct method falls back to `cube_center` at rank 0; the Lindstrom
    /// methods linearize about the configured mass point.
    pub fn solve(
        &self,
        samples: &[GradientSample],
        isovalue: f64,
        cube_center: [f64; 3],
    ) -> Result<ReconstructedPoint, SolveError> {
        if samples.is_empty() {
            return Err(SolveError::NoSamples);
        }
        let cfg = &self.config;
        match cfg.method {
            SolveMethod::Direct => solve_direct(samples, isovalue, cube_center, cfg),
            SolveMethod::Lindstrom => {
                solve_lindstrom(samples, isovalue, self.mass_point(samples, cube_center), cfg)
            }
            SolveMethod::Lindstrom2 => solve_lindstrom_truncated(
                samples,
                isovalue,
                self.mass_point(samples, cube_center),
                cfg,
            ),
            SolveMethod::LindstromFast => {
                solve_lindstrom_fast(samples, isovalue, self.mass_point(samples, cube_center), cfg)
            }
        }
    }

    fn mass_point(&self, samples: &[GradientSample], cube_center: [f64; 3]) -> [f64; 3] {
        match self.config.mass_point {
            MassPoint::CubeCenter => cube_center,
            MassPoint::SampleCentroid => weighted_centroid(samples).unwrap_or(cube_center),
        }
    }
}
