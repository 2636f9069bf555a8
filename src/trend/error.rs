use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrendError {
    #[error("no risk assessments to forecast from")]
    InsufficientHistory,
}
