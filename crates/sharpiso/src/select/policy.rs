use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Which grid vertices (or derived points) contribute gradient samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSet {
    /// The 8 cube corners.
    CubeVertices,
    /// Cube corners plus the vertex layers just outside each facet.
    #[default]
    NeighborVertices,
    /// Endpoints of bipolar cube edges.
    CubeBipolarEndpoints,
    /// Endpoints of bipolar edges of the cube and its six face neighbors.
    NeighborBipolarEndpoints,
    /// Per bipolar cube edge, the endpoint whose gradient determines where
    /// the isosurface crosses the edge.
    EdgeIntersectionDeterminers,
    /// Per bipolar cube edge, the linearly interpolated crossing with an
    /// interpolated gradient.
    EdgeIntersectionsInterpolated,
    /// Per bipolar cube edge, the crossing predicted by the determining
    /// endpoint's gradient.
    EdgeIntersectionsFromGradients,
}

/// Parameters of the gradient sample selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    /// Candidate enumeration mode.
    pub candidates: CandidateSet,
    /// Keep only samples whose isoplane crosses the (offset) cube.
    pub filter_by_isoplane: bool,
    /// Count a determining vertex once per edge it determines.
    ///
    /// Only affects [`CandidateSet::EdgeIntersectionDeterminers`]; the other
    /// modes never emit a vertex twice.
    pub allow_duplicates: bool,
    /// Gradients whose magnitude is below this value are dropped.
    pub max_small_magnitude: f64,
    /// Grow (positive) or shrink (negative) the cube used by the isoplane
    /// filter, in grid units per side. Must lie in `(-1, 1]`.
    pub grad_selection_cube_offset: f64,
    /// Denominator guard for the edge-determination rule.
    pub zero_tolerance: f64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            candidates: CandidateSet::NeighborVertices,
            filter_by_isoplane: true,
            allow_duplicates: false,
            max_small_magnitude: 0.0,
            grad_selection_cube_offset: 0.0,
            zero_tolerance: 1e-7,
        }
    }
}

impl SelectionPolicy {
    /// Default thresholds with the candidate mode and filter of `method`.
    pub fn from_method(method: GradSelectionMethod) -> Self {
        let mut policy = Self::default();
        policy.apply_method(method);
        policy
    }

    /// Switch to the candidate mode, filter and duplicate handling of
    /// `method`, keeping the numeric thresholds.
    pub fn apply_method(&mut self, method: GradSelectionMethod) {
        let (candidates, filter_by_isoplane, allow_duplicates) = method.parts();
        self.candidates = candidates;
        self.filter_by_isoplane = filter_by_isoplane;
        self.allow_duplicates = allow_duplicates;
    }

    /// Check the offset range and that both thresholds are finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let offset = self.grad_selection_cube_offset;
        if !offset.is_finite() || offset <= -1.0 || offset > 1.0 {
            return Err(ConfigError::IllFormedOffset { value: offset });
        }
        if !self.max_small_magnitude.is_finite() || self.max_small_magnitude < 0.0 {
            return Err(ConfigError::InvalidMagnitudeThreshold {
                value: self.max_small_magnitude,
            });
        }
        if !self.zero_tolerance.is_finite() || self.zero_tolerance < 0.0 {
            return Err(ConfigError::InvalidZeroTolerance {
                value: self.zero_tolerance,
            });
        }
        Ok(())
    }
}

/// Named selection presets.
///
/// `C` = cube, `N` = neighbors, `IE` = intersected-edge endpoints,
/// `CD` = edge-determining endpoints, `ES`/`EC` = edge intersections
/// (interpolated / from gradients). For the vertex presets a trailing `S`
/// enables the isoplane filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradSelectionMethod {
    #[serde(rename = "gradC")]
    GradC,
    #[serde(rename = "gradCS")]
    GradCS,
    #[serde(rename = "gradN")]
    GradN,
    #[serde(rename = "gradNS")]
    GradNS,
    #[serde(rename = "gradIE")]
    GradIE,
    #[serde(rename = "gradIES")]
    GradIES,
    #[serde(rename = "gradNIE")]
    GradNIE,
    #[serde(rename = "gradNIES")]
    GradNIES,
    #[serde(rename = "gradCD")]
    GradCD,
    #[serde(rename = "gradCDdup")]
    GradCDDup,
    #[serde(rename = "gradES")]
    GradES,
    #[serde(rename = "gradEC")]
    GradEC,
}

impl GradSelectionMethod {
    /// Every preset, in listing order.
    pub const ALL: [GradSelectionMethod; 12] = [
        Self::GradC,
        Self::GradCS,
        Self::GradN,
        Self::GradNS,
        Self::GradIE,
        Self::GradIES,
        Self::GradNIE,
        Self::GradNIES,
        Self::GradCD,
        Self::GradCDDup,
        Self::GradES,
        Self::GradEC,
    ];

    /// Preset name as accepted on the command line and in JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GradC => "gradC",
            Self::GradCS => "gradCS",
            Self::GradN => "gradN",
            Self::GradNS => "gradNS",
            Self::GradIE => "gradIE",
            Self::GradIES => "gradIES",
            Self::GradNIE => "gradNIE",
            Self::GradNIES => "gradNIES",
            Self::GradCD => "gradCD",
            Self::GradCDDup => "gradCDdup",
            Self::GradES => "gradES",
            Self::GradEC => "gradEC",
        }
    }

    /// One-line human-readable summary.
    pub fn description(self) -> &'static str {
        match self {
            Self::GradC => "gradients at cube vertices",
            Self::GradCS => "selected gradients at cube vertices",
            Self::GradN => "gradients at cube and neighboring vertices",
            Self::GradNS => "selected gradients at cube and neighboring vertices",
            Self::GradIE => "gradients at endpoints of intersected cube edges",
            Self::GradIES => "selected gradients at endpoints of intersected cube edges",
            Self::GradNIE => "gradients at endpoints of intersected cube and neighbor edges",
            Self::GradNIES => {
                "selected gradients at endpoints of intersected cube and neighbor edges"
            }
            Self::GradCD => "gradients determining edge intersections",
            Self::GradCDDup => "gradients determining edge intersections, weighted per edge",
            Self::GradES => "interpolated gradients at edge intersections",
            Self::GradEC => "endpoint gradients at gradient-predicted edge intersections",
        }
    }

    /// (candidate set, isoplane filter, duplicates)
    fn parts(self) -> (CandidateSet, bool, bool) {
        use CandidateSet::*;
        match self {
            Self::GradC => (CubeVertices, false, false),
            Self::GradCS => (CubeVertices, true, false),
            Self::GradN => (NeighborVertices, false, false),
            Self::GradNS => (NeighborVertices, true, false),
            Self::GradIE => (CubeBipolarEndpoints, false, false),
            Self::GradIES => (CubeBipolarEndpoints, true, false),
            Self::GradNIE => (NeighborBipolarEndpoints, false, false),
            Self::GradNIES => (NeighborBipolarEndpoints, true, false),
            Self::GradCD => (EdgeIntersectionDeterminers, false, false),
            Self::GradCDDup => (EdgeIntersectionDeterminers, false, true),
            Self::GradES => (EdgeIntersectionsInterpolated, false, false),
            Self::GradEC => (EdgeIntersectionsFromGradients, false, false),
        }
    }
}

impl std::fmt::Display for GradSelectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GradSelectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                format!(
                    "unknown selection method '{}' (expected one of {})",
                    s,
                    names.join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_round_trip() {
        for m in GradSelectionMethod::ALL {
            let parsed: GradSelectionMethod = m.as_str().parse().expect("known name");
            assert_eq!(parsed, m);
            let json = serde_json::to_string(&m).expect("serialize");
            assert_eq!(json, format!("\"{}\"", m.as_str()));
        }
        assert!("gradX".parse::<GradSelectionMethod>().is_err());
    }

    #[test]
    fn s_suffix_enables_isoplane_filter() {
        use GradSelectionMethod::*;
        for (plain, selected) in [
            (GradC, GradCS),
            (GradN, GradNS),
            (GradIE, GradIES),
            (GradNIE, GradNIES),
        ] {
            let a = SelectionPolicy::from_method(plain);
            let b = SelectionPolicy::from_method(selected);
            assert_eq!(a.candidates, b.candidates, "{plain} vs {selected}");
            assert!(!a.filter_by_isoplane, "{plain}");
            assert!(b.filter_by_isoplane, "{selected}");
        }
        assert!(SelectionPolicy::from_method(GradCDDup).allow_duplicates);
        assert!(!SelectionPolicy::from_method(GradCD).allow_duplicates);
    }

    #[test]
    fn applying_a_preset_keeps_thresholds() {
        let mut p = SelectionPolicy {
            max_small_magnitude: 0.3,
            grad_selection_cube_offset: 0.25,
            zero_tolerance: 1e-5,
            ..SelectionPolicy::from_method(GradSelectionMethod::GradNS)
        };
        p.apply_method(GradSelectionMethod::GradCDDup);
        assert_eq!(p.candidates, CandidateSet::EdgeIntersectionDeterminers);
        assert!(!p.filter_by_isoplane);
        assert!(p.allow_duplicates);
        assert_eq!(p.max_small_magnitude, 0.3);
        assert_eq!(p.grad_selection_cube_offset, 0.25);
        assert_eq!(p.zero_tolerance, 1e-5);
    }

    #[test]
    fn offset_range_is_half_open() {
        let mut p = SelectionPolicy::default();
        for ok in [-0.99, 0.0, 0.5, 1.0] {
            p.grad_selection_cube_offset = ok;
            assert!(p.validate().is_ok(), "offset {ok} should be accepted");
        }
        for bad in [-1.0, -1.5, 1.0001, f64::NAN] {
            p.grad_selection_cube_offset = bad;
            assert!(
                matches!(p.validate(), Err(ConfigError::IllFormedOffset { .. })),
                "offset {bad} should be rejected"
            );
        }
    }

    #[test]
    fn negative_thresholds_are_rejected() {
        let p = SelectionPolicy {
            max_small_magnitude: -0.1,
            ..SelectionPolicy::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ConfigError::InvalidMagnitudeThreshold { .. })
        ));
        let p = SelectionPolicy {
            zero_tolerance: -1.0,
            ..SelectionPolicy::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ConfigError::InvalidZeroTolerance { .. })
        ));
    }
}
