use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AcquireError {
    /// Neither the catalog nor the element store could supply the object.
    #[error("no element set available for catalog {0}")]
    Unavailable(u32),
    #[error("catalog source unreachable after {0} attempts")]
    SourceExhausted(u32),
    #[error("resolution cancelled")]
    Cancelled,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
