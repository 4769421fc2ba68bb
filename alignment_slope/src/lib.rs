//! Vertical alignment interpolation and slope change analysis.

pub mod alignment;
pub mod analysis;
pub mod config;
pub mod error;
pub mod slope;
pub mod stations;

pub use alignment::{VerticalCurveType, VerticalProfile, VerticalSegment};
pub use config::AnalysisConfig;
pub use error::{ProfileError, Result};
pub use slope::{SlopeChangeDetector, SlopeChangeKind, SlopeChangePoint};
