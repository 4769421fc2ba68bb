//! Analysis parameters.

use crate::error::Result;

/// Tunable parameters of a slope analysis run.
///
/// Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum decimal grade difference reported as a change (0.01 = 1%).
    pub grade_change_threshold: f64,
    /// Known points closer than this to a detected point are dropped.
    pub known_point_tolerance: f64,
    /// Maximum distance between a segment boundary and the referent it is labelled at.
    pub boundary_tolerance: f64,
    /// Spacing of the sampled station table.
    pub station_interval: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            grade_change_threshold: 0.01,
            known_point_tolerance: 0.5,
            boundary_tolerance: 5.0,
            station_interval: 20.0,
        }
    }
}

impl AnalysisConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = AnalysisConfig::from_json(r#"{ "known_point_tolerance": 5.0 }"#).unwrap();
        assert!((cfg.known_point_tolerance - 5.0).abs() < 1e-9);
        assert!((cfg.grade_change_threshold - 0.01).abs() < 1e-9);
        assert!((cfg.boundary_tolerance - 5.0).abs() < 1e-9);
        assert!((cfg.station_interval - 20.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(AnalysisConfig::from_json("{ grade_change_threshold: }").is_err());
    }
}
