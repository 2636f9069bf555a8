use thiserror::Error;

use crate::propagate::Frame;

#[derive(Debug, Error)]
pub enum PropagationError {
    #[error("catalog {catalog_id}: eccentricity {eccentricity} does not describe a closed orbit")]
    OpenOrbit { catalog_id: u32, eccentricity: f64 },
    #[error("catalog {catalog_id}: mean motion {mean_motion} rev/day is not usable")]
    MeanMotion { catalog_id: u32, mean_motion: f64 },
    #[error("catalog {catalog_id}: invalid elements: {message}")]
    Elements { catalog_id: u32, message: String },
    #[error("catalog {catalog_id}: sgp4 failed: {message}")]
    Sgp4 { catalog_id: u32, message: String },
    #[error("catalog {catalog_id}: propagated state is not finite")]
    NonFinite { catalog_id: u32 },
    #[error("catalog {catalog_id}: horizon has no samples")]
    EmptyHorizon { catalog_id: u32 },
    #[error("expected a {expected} state vector, got {actual}")]
    Frame { expected: Frame, actual: Frame },
}
