//! Detection of significant grade changes along a vertical profile.

use std::fmt;

use log::{debug, info};

use crate::alignment::VerticalProfile;

/// Where a slope change was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SlopeChangeKind {
    /// Grade varies across a vertical curve; reported at the curve end.
    WithinCurve,
    /// Grade jumps at the boundary of two adjacent segments.
    BetweenSegments,
    /// Supplied by the caller rather than detected.
    Manual,
}

impl fmt::Display for SlopeChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlopeChangeKind::WithinCurve => "curve",
            SlopeChangeKind::BetweenSegments => "transition",
            SlopeChangeKind::Manual => "manual",
        };
        f.write_str(name)
    }
}

/// Station where the grade changes by more than a threshold.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlopeChangePoint {
    pub station: f64,
    pub from_grade: f64,
    pub to_grade: f64,
    pub height: f64,
    pub kind: SlopeChangeKind,
}

impl SlopeChangePoint {
    /// Creates a caller supplied change point.
    pub fn manual(station: f64, from_grade: f64, to_grade: f64, height: f64) -> Self {
        Self {
            station,
            from_grade,
            to_grade,
            height,
            kind: SlopeChangeKind::Manual,
        }
    }

    /// Absolute grade difference across the point.
    pub fn grade_change(&self) -> f64 {
        (self.to_grade - self.from_grade).abs()
    }

    /// Annotation text, grades in percent.
    pub fn label(&self) -> String {
        format!(
            "Grade Change: {:.1}% → {:.1}%",
            self.from_grade * 100.0,
            self.to_grade * 100.0
        )
    }
}

/// Scans a profile for grade changes larger than `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct SlopeChangeDetector<'a> {
    profile: &'a VerticalProfile,
    threshold: f64,
}

impl<'a> SlopeChangeDetector<'a> {
    /// Threshold used by [`SlopeChangeDetector::with_default_threshold`]: one percentage point.
    pub const DEFAULT_THRESHOLD: f64 = 0.01;

    pub fn new(profile: &'a VerticalProfile, threshold: f64) -> Self {
        Self { profile, threshold }
    }

    pub fn with_default_threshold(profile: &'a VerticalProfile) -> Self {
        Self::new(profile, Self::DEFAULT_THRESHOLD)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns change points in segment scan order.
    ///
    /// For each segment a curve change (at the segment end) is emitted before
    /// the transition change at its start. Differences equal to the threshold
    /// are not reported.
    pub fn detect_changes(&self) -> Vec<SlopeChangePoint> {
        let segments = self.profile.segments();
        let mut changes = Vec::new();
        for (i, seg) in segments.iter().enumerate() {
            if (seg.start_grade - seg.end_grade).abs() > self.threshold {
                let station = seg.end_station();
                let point = SlopeChangePoint {
                    station,
                    from_grade: seg.start_grade,
                    to_grade: seg.end_grade,
                    height: self.profile.height_at(station),
                    kind: SlopeChangeKind::WithinCurve,
                };
                debug!("curve grade change at station {:.3}", station);
                changes.push(point);
            }
            if i > 0 {
                let prev = &segments[i - 1];
                if (seg.start_grade - prev.end_grade).abs() > self.threshold {
                    // Boundary station: the segment's own start height is exact.
                    let point = SlopeChangePoint {
                        station: seg.start_distance,
                        from_grade: prev.end_grade,
                        to_grade: seg.start_grade,
                        height: seg.start_height,
                        kind: SlopeChangeKind::BetweenSegments,
                    };
                    debug!("transition grade change at station {:.3}", seg.start_distance);
                    changes.push(point);
                }
            }
        }
        info!(
            "detected {} slope changes over {} segments",
            changes.len(),
            segments.len()
        );
        changes
    }

    /// Adds `known` points that have no detected point within `tolerance`.
    ///
    /// Detected points are always kept. Known points are not compared with
    /// each other. The result is sorted by station.
    pub fn merge_known(
        detected: Vec<SlopeChangePoint>,
        known: &[SlopeChangePoint],
        tolerance: f64,
    ) -> Vec<SlopeChangePoint> {
        let detected_count = detected.len();
        let mut merged = detected;
        for point in known {
            let exists = merged[..detected_count]
                .iter()
                .any(|d| (d.station - point.station).abs() < tolerance);
            if !exists {
                merged.push(point.clone());
            }
        }
        merged.sort_by(|a, b| a.station.total_cmp(&b.station));
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::VerticalSegment;

    #[test]
    fn transition_between_constant_grades() {
        let profile = VerticalProfile::new(vec![
            VerticalSegment::constant(0.0, 50.0, 10.0, 0.02),
            VerticalSegment::constant(50.0, 50.0, 11.0, -0.04),
        ]);
        let changes = SlopeChangeDetector::new(&profile, 0.01).detect_changes();
        assert_eq!(changes.len(), 1);
        let c = &changes[0];
        assert_eq!(c.kind, SlopeChangeKind::BetweenSegments);
        assert!((c.station - 50.0).abs() < 1e-9);
        assert!((c.from_grade - 0.02).abs() < 1e-9);
        assert!((c.to_grade + 0.04).abs() < 1e-9);
        assert!((c.height - 11.0).abs() < 1e-9);
    }

    #[test]
    fn curve_change_reported_at_end() {
        let profile = VerticalProfile::new(vec![VerticalSegment::parabolic(
            28.36, 35.11, 2.93, -0.03, 0.0202,
        )]);
        let changes = SlopeChangeDetector::with_default_threshold(&profile).detect_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, SlopeChangeKind::WithinCurve);
        assert!((changes[0].station - (28.36 + 35.11)).abs() < 1e-9);
        assert!((changes[0].height - profile.height_at(28.36 + 35.11)).abs() < 1e-9);
    }

    #[test]
    fn curve_change_precedes_transition_of_same_segment() {
        let profile = VerticalProfile::new(vec![
            VerticalSegment::constant(0.0, 10.0, 0.0, 0.05),
            VerticalSegment::parabolic(10.0, 20.0, 0.5, -0.02, 0.03),
        ]);
        let kinds: Vec<_> = SlopeChangeDetector::new(&profile, 0.01)
            .detect_changes()
            .into_iter()
            .map(|c| c.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![SlopeChangeKind::WithinCurve, SlopeChangeKind::BetweenSegments]
        );
    }

    #[test]
    fn label_in_percent() {
        let p = SlopeChangePoint::manual(106.86, 0.0202, -0.04, 3.63);
        assert_eq!(p.label(), "Grade Change: 2.0% → -4.0%");
    }
}
