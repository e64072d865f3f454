//! Top-level configuration and configuration-time errors.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::select::{GradSelectionMethod, SelectionPolicy};
use crate::svd::SvdConfig;

/// Invalid parameters, reported once when the runtime objects are built.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// SVD error tolerance outside `(0, 1)` or not finite.
    DegenerateTolerance {
        /// Rejected value.
        value: f64,
    },
    /// Selection cube offset outside `(-1, 1]` or not finite.
    IllFormedOffset {
        /// Rejected value.
        value: f64,
    },
    /// Negative or non-finite small-gradient threshold.
    InvalidMagnitudeThreshold {
        /// Rejected value.
        value: f64,
    },
    /// Negative or non-finite zero tolerance.
    InvalidZeroTolerance {
        /// Rejected value.
        value: f64,
    },
    /// Maximum rank outside `1..=3`.
    InvalidMaxRank {
        /// Rejected value.
        value: usize,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateTolerance { value } => {
                write!(f, "error_tolerance must be in (0, 1), got {}", value)
            }
            Self::IllFormedOffset { value } => write!(
                f,
                "grad_selection_cube_offset must be in (-1, 1], got {}",
                value
            ),
            Self::InvalidMagnitudeThreshold { value } => write!(
                f,
                "max_small_magnitude must be finite and >= 0, got {}",
                value
            ),
            Self::InvalidZeroTolerance { value } => {
                write!(f, "zero_tolerance must be finite and >= 0, got {}", value)
            }
            Self::InvalidMaxRank { value } => {
                write!(f, "max_rank must be 1, 2 or 3, got {}", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Complete configuration of the select → solve pipeline.
///
/// Every field has a default, so partial JSON overlays are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpIsoConfig {
    /// Which gradients are gathered around a cube.
    pub selection: SelectionPolicy,
    /// How the gathered gradients are solved.
    pub svd: SvdConfig,
}

impl SharpIsoConfig {
    /// Default solver settings with a named selection preset.
    pub fn from_method(method: GradSelectionMethod) -> Self {
        Self {
            selection: SelectionPolicy::from_method(method),
            svd: SvdConfig::default(),
        }
    }

    /// Validate the selection policy, then the solver settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selection.validate()?;
        self.svd.validate()
    }

    /// Parse and validate a (possibly partial) JSON config.
    pub fn from_json_str(raw: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }
}
