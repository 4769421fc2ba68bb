use thiserror::Error;

/// Errors raised while building profiles or running an analysis.
///
/// Profile queries themselves never fail; these only come from input parsing
/// and analysis parameters.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("unrecognized vertical segment type `{0}`")]
    UnknownCurveType(String),
    #[error("station interval must be a positive finite number, got {0}")]
    InvalidInterval(f64),
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProfileError>;
