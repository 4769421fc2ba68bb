//! Station tables, boundary labels and summary figures derived from a profile.

use std::fmt::Write as _;

use log::info;

use crate::alignment::VerticalProfile;
use crate::config::AnalysisConfig;
use crate::error::{ProfileError, Result};
use crate::slope::{SlopeChangeDetector, SlopeChangePoint};
use crate::stations::StationIndex;

/// Elevation and grade sampled at a station.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StationSample {
    pub station: f64,
    pub height: f64,
    pub grade: f64,
}

/// Upper bound on the number of rows [`sample_stations`] produces.
pub const MAX_STATION_SAMPLES: usize = 100_000;

/// Samples the profile every `interval` meters from station 0 to its end.
///
/// Intervals that would yield more than [`MAX_STATION_SAMPLES`] rows are rejected.
pub fn sample_stations(profile: &VerticalProfile, interval: f64) -> Result<Vec<StationSample>> {
    if !(interval.is_finite() && interval > 0.0) {
        return Err(ProfileError::InvalidInterval(interval));
    }
    let end = match profile.end_station() {
        Some(end) if end.is_finite() && end >= 0.0 => end,
        _ => return Ok(Vec::new()),
    };
    let count = (end / interval).floor();
    if count > MAX_STATION_SAMPLES as f64 {
        return Err(ProfileError::InvalidInterval(interval));
    }
    let count = count as usize;
    let samples = (0..=count)
        .map(|i| i as f64 * interval)
        .filter(|station| *station <= end)
        .map(|station| StationSample {
            station,
            height: profile.height_at(station),
            grade: profile.grade_at(station),
        })
        .collect();
    Ok(samples)
}

/// Sense of the grade at a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SlopeDirection {
    Upward,
    Downward,
}

/// Grade information attached to a referent station.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StationSlope {
    pub station: f64,
    pub grade: f64,
    pub height: f64,
    pub direction: SlopeDirection,
}

impl StationSlope {
    /// Annotation text, e.g. `Grade: +2.0%`.
    pub fn label(&self) -> String {
        format!("Grade: {:+.1}%", self.grade * 100.0)
    }
}

/// Grade and height at every other referent station.
pub fn station_slopes(profile: &VerticalProfile, index: &StationIndex) -> Vec<StationSlope> {
    index
        .every_other()
        .map(|station| {
            let grade = profile.grade_at(station);
            StationSlope {
                station,
                grade,
                height: profile.height_at(station),
                direction: if grade >= 0.0 {
                    SlopeDirection::Upward
                } else {
                    SlopeDirection::Downward
                },
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BoundarySide {
    Start,
    End,
}

/// Label placed at the referent nearest to a segment start or end.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundaryLabel {
    /// 1-based segment number.
    pub segment: usize,
    pub side: BoundarySide,
    pub station: f64,
    pub referent_station: f64,
    pub text: String,
}

/// Segment start and end labels that have a referent within `tolerance`.
pub fn segment_boundaries(
    profile: &VerticalProfile,
    index: &StationIndex,
    tolerance: f64,
) -> Vec<BoundaryLabel> {
    let mut labels = Vec::new();
    for (i, seg) in profile.segments().iter().enumerate() {
        let number = i + 1;
        for (station, side) in [
            (seg.start_distance, BoundarySide::Start),
            (seg.end_station(), BoundarySide::End),
        ] {
            let Some(referent_station) = index.nearest(station, tolerance) else {
                continue;
            };
            let prefix = match side {
                BoundarySide::Start => "Segment Start",
                BoundarySide::End => "Segment End",
            };
            labels.push(BoundaryLabel {
                segment: number,
                side,
                station,
                referent_station,
                text: format!("{prefix} - Seg {number}"),
            });
        }
    }
    labels
}

/// Headline figures of a profile.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProfileSummary {
    pub total_length: f64,
    pub steepest_upward: f64,
    pub steepest_downward: f64,
    pub change_count: usize,
    pub max_grade_change: f64,
}

impl ProfileSummary {
    pub fn from_profile(profile: &VerticalProfile, changes: &[SlopeChangePoint]) -> Self {
        let grades = profile
            .segments()
            .iter()
            .flat_map(|s| [s.start_grade, s.end_grade]);
        let (up, down) = grades.fold((f64::NEG_INFINITY, f64::INFINITY), |(up, down), g| {
            (up.max(g), down.min(g))
        });
        Self {
            total_length: profile.end_station().unwrap_or(0.0),
            steepest_upward: if profile.is_empty() { 0.0 } else { up },
            steepest_downward: if profile.is_empty() { 0.0 } else { down },
            change_count: changes.len(),
            max_grade_change: changes
                .iter()
                .map(SlopeChangePoint::grade_change)
                .fold(0.0, f64::max),
        }
    }
}

/// Full result of a slope analysis run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProfileAnalysis {
    pub profile: VerticalProfile,
    pub changes: Vec<SlopeChangePoint>,
    pub samples: Vec<StationSample>,
    pub summary: ProfileSummary,
}

impl ProfileAnalysis {
    /// Detects changes, merges `known` points and samples the station table.
    pub fn run(
        profile: VerticalProfile,
        known: &[SlopeChangePoint],
        config: &AnalysisConfig,
    ) -> Result<Self> {
        let detected =
            SlopeChangeDetector::new(&profile, config.grade_change_threshold).detect_changes();
        let changes =
            SlopeChangeDetector::merge_known(detected, known, config.known_point_tolerance);
        let samples = sample_stations(&profile, config.station_interval)?;
        let summary = ProfileSummary::from_profile(&profile, &changes);
        info!(
            "slope analysis: {:.2} m, {} segments, {} changes",
            summary.total_length,
            profile.len(),
            changes.len()
        );
        Ok(Self {
            profile,
            changes,
            samples,
            summary,
        })
    }

    /// Plain-text report of the analysis.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);
        let summary = &self.summary;
        writeln!(&mut out, "{rule}").unwrap();
        writeln!(&mut out, "SLOPE ANALYSIS REPORT").unwrap();
        writeln!(&mut out, "{rule}").unwrap();
        writeln!(&mut out).unwrap();

        writeln!(&mut out, "ALIGNMENT OVERVIEW:").unwrap();
        writeln!(&mut out, "   Total Length: {:.2} meters", summary.total_length).unwrap();
        writeln!(&mut out, "   Number of Vertical Segments: {}", self.profile.len()).unwrap();
        writeln!(&mut out, "   Number of Slope Changes: {}", summary.change_count).unwrap();
        writeln!(&mut out).unwrap();

        writeln!(&mut out, "SLOPE CHANGE POINTS:").unwrap();
        for (i, point) in self.changes.iter().enumerate() {
            writeln!(
                &mut out,
                "   {}. Station {:.1}m ({}):",
                i + 1,
                point.station,
                point.kind
            )
            .unwrap();
            writeln!(
                &mut out,
                "      Grade Change: {:.1}% -> {:.1}%",
                point.from_grade * 100.0,
                point.to_grade * 100.0
            )
            .unwrap();
            writeln!(&mut out, "      Height: {:.2}m", point.height).unwrap();
        }
        writeln!(&mut out).unwrap();

        writeln!(&mut out, "VERTICAL SEGMENTS:").unwrap();
        for (i, seg) in self.profile.segments().iter().enumerate() {
            writeln!(
                &mut out,
                "   Segment {}: Station {:.1}m - {:.1}m",
                i + 1,
                seg.start_distance,
                seg.end_station()
            )
            .unwrap();
            writeln!(&mut out, "      Length: {:.1}m", seg.length).unwrap();
            writeln!(&mut out, "      Type: {}", seg.curve_type).unwrap();
            if (seg.start_grade - seg.end_grade).abs() < f64::EPSILON {
                let grade = seg.start_grade * 100.0;
                writeln!(&mut out, "      Grade: {grade:.1}% (constant)").unwrap();
            } else {
                writeln!(
                    &mut out,
                    "      Grade: {:.1}% -> {:.1}%",
                    seg.start_grade * 100.0,
                    seg.end_grade * 100.0
                )
                .unwrap();
            }
            writeln!(&mut out, "      Start Height: {:.2}m", seg.start_height).unwrap();
        }
        writeln!(&mut out).unwrap();

        writeln!(&mut out, "STATION ANALYSIS:").unwrap();
        for s in &self.samples {
            writeln!(
                &mut out,
                "   Station {:>6.1}m: Height {:5.2}m, Slope {:+5.1}%",
                s.station,
                s.height,
                s.grade * 100.0
            )
            .unwrap();
        }
        writeln!(&mut out).unwrap();

        writeln!(&mut out, "SUMMARY:").unwrap();
        let up = summary.steepest_upward * 100.0;
        let down = summary.steepest_downward * 100.0;
        let max_change = summary.max_grade_change * 100.0;
        writeln!(&mut out, "   Steepest upward grade: {up:.1}%").unwrap();
        writeln!(&mut out, "   Steepest downward grade: {down:.1}%").unwrap();
        writeln!(&mut out, "   Maximum grade change: {max_change:.1}%").unwrap();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::VerticalSegment;

    #[test]
    fn sampling_stops_at_profile_end() {
        let profile = VerticalProfile::new(vec![VerticalSegment::constant(0.0, 45.0, 1.0, 0.02)]);
        let samples = sample_stations(&profile, 20.0).unwrap();
        let stations: Vec<f64> = samples.iter().map(|s| s.station).collect();
        assert_eq!(stations, vec![0.0, 20.0, 40.0]);
        assert!((samples[2].height - 1.8).abs() < 1e-9);
    }

    #[test]
    fn sampling_rejects_bad_interval() {
        let profile = VerticalProfile::default();
        assert!(matches!(
            sample_stations(&profile, 0.0),
            Err(ProfileError::InvalidInterval(_))
        ));
        assert!(sample_stations(&profile, f64::NAN).is_err());
        assert!(sample_stations(&profile, 10.0).unwrap().is_empty());
    }

    #[test]
    fn sampling_rejects_interval_with_too_many_rows() {
        let profile =
            VerticalProfile::new(vec![VerticalSegment::constant(0.0, 1.0e6, 0.0, 0.01)]);
        assert!(matches!(
            sample_stations(&profile, 1e-12),
            Err(ProfileError::InvalidInterval(i)) if i == 1e-12
        ));
        let rows = sample_stations(&profile, 1.0e6 / MAX_STATION_SAMPLES as f64).unwrap();
        assert_eq!(rows.len(), MAX_STATION_SAMPLES + 1);
    }

    #[test]
    fn station_slope_direction() {
        let profile = VerticalProfile::new(vec![
            VerticalSegment::constant(0.0, 10.0, 0.0, 0.02),
            VerticalSegment::constant(10.0, 10.0, 0.2, -0.01),
        ]);
        let index = StationIndex::from_stations(vec![5.0, 10.0, 15.0]);
        let slopes = station_slopes(&profile, &index);
        assert_eq!(slopes.len(), 2);
        assert_eq!(slopes[0].direction, SlopeDirection::Upward);
        assert_eq!(slopes[1].direction, SlopeDirection::Downward);
        assert_eq!(slopes[0].label(), "Grade: +2.0%");
        assert_eq!(slopes[1].label(), "Grade: -1.0%");
    }
}
