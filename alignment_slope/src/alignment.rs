use std::fmt;
use std::str::FromStr;

use log::{debug, warn};

use crate::error::{ProfileError, Result};

/// Interpolation rule of a vertical segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VerticalCurveType {
    /// Straight grade, elevation changes linearly.
    ConstantGradient,
    /// Vertical curve whose grade varies linearly from start to end.
    ParabolicCurve,
}

impl VerticalCurveType {
    /// Tag written for this curve type in alignment models.
    pub fn tag(self) -> &'static str {
        match self {
            VerticalCurveType::ConstantGradient => "CONSTANTGRADIENT",
            VerticalCurveType::ParabolicCurve => "PARABOLICARC",
        }
    }
}

impl FromStr for VerticalCurveType {
    type Err = ProfileError;

    /// Parses model tags such as `.CONSTANTGRADIENT.` or `PARABOLICARC`.
    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().trim_matches('.').to_ascii_uppercase();
        match tag.as_str() {
            "CONSTANTGRADIENT" => Ok(VerticalCurveType::ConstantGradient),
            "PARABOLICARC" | "CIRCULARARC" => Ok(VerticalCurveType::ParabolicCurve),
            _ => Err(ProfileError::UnknownCurveType(s.to_string())),
        }
    }
}

impl TryFrom<String> for VerticalCurveType {
    type Error = ProfileError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<VerticalCurveType> for String {
    fn from(value: VerticalCurveType) -> Self {
        value.tag().to_string()
    }
}

impl fmt::Display for VerticalCurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One piece of the longitudinal elevation profile.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VerticalSegment {
    pub start_distance: f64,
    pub length: f64,
    pub start_height: f64,
    pub start_grade: f64,
    pub end_grade: f64,
    pub curve_type: VerticalCurveType,
    /// Informational only; not used by any height or grade computation.
    #[serde(default)]
    pub radius: Option<f64>,
}

impl VerticalSegment {
    /// Creates a constant grade segment.
    pub fn constant(start_distance: f64, length: f64, start_height: f64, grade: f64) -> Self {
        Self {
            start_distance,
            length,
            start_height,
            start_grade: grade,
            end_grade: grade,
            curve_type: VerticalCurveType::ConstantGradient,
            radius: None,
        }
    }

    /// Creates a vertical curve segment running from `start_grade` to `end_grade`.
    pub fn parabolic(
        start_distance: f64,
        length: f64,
        start_height: f64,
        start_grade: f64,
        end_grade: f64,
    ) -> Self {
        Self {
            start_distance,
            length,
            start_height,
            start_grade,
            end_grade,
            curve_type: VerticalCurveType::ParabolicCurve,
            radius: None,
        }
    }

    /// Builds a segment from the design parameters stored in an alignment model.
    ///
    /// A missing end gradient means the segment keeps its start gradient.
    pub fn from_design_parameters(
        start_dist_along: f64,
        horizontal_length: f64,
        start_height: f64,
        start_gradient: f64,
        end_gradient: Option<f64>,
        predefined_type: &str,
    ) -> Result<Self> {
        let curve_type = predefined_type.parse()?;
        Ok(Self {
            start_distance: start_dist_along,
            length: horizontal_length,
            start_height,
            start_grade: start_gradient,
            end_grade: end_gradient.unwrap_or(start_gradient),
            curve_type,
            radius: None,
        })
    }

    /// Station at which the segment ends.
    pub fn end_station(&self) -> f64 {
        self.start_distance + self.length
    }

    /// Whether `station` lies on this segment, boundaries included.
    pub fn contains(&self, station: f64) -> bool {
        self.start_distance <= station && station <= self.end_station()
    }

    /// Interpolation parameter at `station`, 0 for zero-length segments.
    pub fn t_at(&self, station: f64) -> f64 {
        if self.length == 0.0 {
            0.0
        } else {
            (station - self.start_distance) / self.length
        }
    }

    fn height_at(&self, station: f64) -> f64 {
        let d = station - self.start_distance;
        match self.curve_type {
            VerticalCurveType::ConstantGradient => self.start_height + d * self.start_grade,
            VerticalCurveType::ParabolicCurve => {
                if self.length == 0.0 {
                    return self.start_height;
                }
                // Average of entry grade and local grade, not true parabolic integration.
                let current = self.grade_at(station);
                self.start_height + d * (self.start_grade + current) / 2.0
            }
        }
    }

    fn grade_at(&self, station: f64) -> f64 {
        match self.curve_type {
            VerticalCurveType::ConstantGradient => self.start_grade,
            VerticalCurveType::ParabolicCurve => {
                self.start_grade + self.t_at(station) * (self.end_grade - self.start_grade)
            }
        }
    }
}

/// Design parameter record as extracted from an alignment model.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DesignParameters {
    start_dist_along: f64,
    horizontal_length: f64,
    start_height: f64,
    start_gradient: f64,
    #[serde(default)]
    end_gradient: Option<f64>,
    predefined_type: String,
    #[serde(default)]
    radius_of_curvature: Option<f64>,
}

impl TryFrom<DesignParameters> for VerticalSegment {
    type Error = ProfileError;

    fn try_from(p: DesignParameters) -> Result<Self> {
        let mut segment = VerticalSegment::from_design_parameters(
            p.start_dist_along,
            p.horizontal_length,
            p.start_height,
            p.start_gradient,
            p.end_gradient,
            &p.predefined_type,
        )?;
        segment.radius = p.radius_of_curvature;
        Ok(segment)
    }
}

/// Vertical alignment made of segments sorted by start station.
///
/// The segment list is fixed after construction, so a profile can be shared
/// between threads and queried without locking.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Vec<VerticalSegment>", into = "Vec<VerticalSegment>")]
pub struct VerticalProfile {
    segments: Vec<VerticalSegment>,
}

impl From<Vec<VerticalSegment>> for VerticalProfile {
    fn from(segments: Vec<VerticalSegment>) -> Self {
        Self::new(segments)
    }
}

impl From<VerticalProfile> for Vec<VerticalSegment> {
    fn from(profile: VerticalProfile) -> Self {
        profile.segments
    }
}

impl VerticalProfile {
    /// Creates a profile from segments in any order.
    ///
    /// Segments are sorted by start station. Ties keep their input order.
    /// Overlaps and negative lengths are logged but accepted.
    pub fn new(mut segments: Vec<VerticalSegment>) -> Self {
        segments.sort_by(|a, b| a.start_distance.total_cmp(&b.start_distance));
        for seg in segments.iter().filter(|s| s.length < 0.0) {
            warn!(
                "vertical segment at station {:.3} has negative length {:.3}",
                seg.start_distance, seg.length
            );
        }
        for pair in segments.windows(2) {
            if pair[1].start_distance < pair[0].end_station() {
                warn!(
                    "vertical segments overlap at station {:.3}; the earlier segment wins",
                    pair[1].start_distance
                );
            }
        }
        debug!("built vertical profile with {} segments", segments.len());
        Self { segments }
    }

    /// Parses a JSON array of design parameter records.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<DesignParameters> = serde_json::from_str(json)?;
        let segments = records
            .into_iter()
            .map(VerticalSegment::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(segments))
    }

    /// Segments in ascending station order.
    pub fn segments(&self) -> &[VerticalSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Start station of the first segment.
    pub fn start_station(&self) -> Option<f64> {
        self.segments.first().map(|s| s.start_distance)
    }

    /// End station of the last segment.
    pub fn end_station(&self) -> Option<f64> {
        self.segments.last().map(VerticalSegment::end_station)
    }

    /// First segment containing `station`. Overlaps resolve to the earliest segment.
    pub fn segment_at(&self, station: f64) -> Option<&VerticalSegment> {
        self.segments.iter().find(|s| s.contains(station))
    }

    /// Elevation at the given station.
    ///
    /// Stations outside every segment are extrapolated from the end of the
    /// last segment along its end grade. An empty profile yields `0.0`.
    pub fn height_at(&self, station: f64) -> f64 {
        if let Some(seg) = self.segment_at(station) {
            return seg.height_at(station);
        }
        match self.segments.last() {
            Some(last) => {
                let last_station = last.end_station();
                let last_height = last.start_height + last.length * last.end_grade;
                last_height + (station - last_station) * last.end_grade
            }
            None => 0.0,
        }
    }

    /// Decimal grade at the given station.
    ///
    /// Outside every segment this is the end grade of the last segment. An
    /// empty profile yields `0.0`.
    pub fn grade_at(&self, station: f64) -> f64 {
        if let Some(seg) = self.segment_at(station) {
            return seg.grade_at(station);
        }
        self.segments.last().map_or(0.0, |s| s.end_grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_grade_segment() {
        let profile = VerticalProfile::new(vec![VerticalSegment::constant(0.0, 100.0, 10.0, 0.05)]);
        assert!((profile.height_at(50.0) - 12.5).abs() < 1e-9);
        assert!((profile.grade_at(50.0) - 0.05).abs() < 1e-9);
        assert!((profile.height_at(150.0) - 17.5).abs() < 1e-9);
    }

    #[test]
    fn parabolic_segment_uses_average_grade() {
        let profile =
            VerticalProfile::new(vec![VerticalSegment::parabolic(0.0, 100.0, 0.0, 0.0, 0.10)]);
        assert!((profile.height_at(50.0) - 1.25).abs() < 1e-9);
        assert!((profile.grade_at(50.0) - 0.05).abs() < 1e-9);
        assert!((profile.grade_at(100.0) - 0.10).abs() < 1e-9);
    }

    #[test]
    fn zero_length_curve_returns_start_values() {
        let seg = VerticalSegment::parabolic(10.0, 0.0, 4.0, 0.02, 0.06);
        let profile = VerticalProfile::new(vec![seg]);
        assert!((profile.height_at(10.0) - 4.0).abs() < 1e-9);
        assert!((profile.grade_at(10.0) - 0.02).abs() < 1e-9);
    }

    #[test]
    fn sorts_segments_by_station() {
        let profile = VerticalProfile::new(vec![
            VerticalSegment::constant(50.0, 50.0, 1.0, 0.0),
            VerticalSegment::constant(0.0, 50.0, 0.0, 0.02),
        ]);
        assert_eq!(profile.start_station(), Some(0.0));
        assert_eq!(profile.end_station(), Some(100.0));
        assert!((profile.segments()[1].start_distance - 50.0).abs() < 1e-9);
    }

    #[test]
    fn overlapping_segments_use_first() {
        let profile = VerticalProfile::new(vec![
            VerticalSegment::constant(0.0, 60.0, 0.0, 0.01),
            VerticalSegment::constant(40.0, 60.0, 100.0, 0.01),
        ]);
        assert!((profile.height_at(50.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn parses_curve_tags() {
        assert_eq!(
            ".CONSTANTGRADIENT.".parse::<VerticalCurveType>().unwrap(),
            VerticalCurveType::ConstantGradient
        );
        assert_eq!(
            "parabolicarc".parse::<VerticalCurveType>().unwrap(),
            VerticalCurveType::ParabolicCurve
        );
        assert_eq!(
            ".CIRCULARARC.".parse::<VerticalCurveType>().unwrap(),
            VerticalCurveType::ParabolicCurve
        );
        assert!(matches!(
            ".CLOTHOID.".parse::<VerticalCurveType>(),
            Err(ProfileError::UnknownCurveType(tag)) if tag == ".CLOTHOID."
        ));
    }

    #[test]
    fn missing_end_gradient_defaults_to_start() {
        let seg = VerticalSegment::from_design_parameters(
            0.0,
            20.0,
            3.5,
            -0.03,
            None,
            ".CONSTANTGRADIENT.",
        )
        .unwrap();
        assert!((seg.end_grade + 0.03).abs() < 1e-9);
        assert_eq!(seg.curve_type, VerticalCurveType::ConstantGradient);
    }
}
