use thiserror::Error;

/// Why a single element record was refused.
#[derive(Debug, Error)]
pub enum ElementError {
    #[error("invalid tle: {0}")]
    Tle(#[from] sgp4::TleError),
    #[error("eccentricity {0} outside [0, 1)")]
    Eccentricity(f64),
    #[error("mean motion {0} rev/day is not a positive finite value")]
    MeanMotion(f64),
    #[error("non-finite element field: {0}")]
    NonFinite(&'static str),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("catalog source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed element set ({rejected} records rejected): {reason}")]
    Malformed { rejected: usize, reason: String },
}
