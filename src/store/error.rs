use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("element set for catalog {catalog_id} cannot be stored under key {key}")]
    KeyMismatch { key: u32, catalog_id: u32 },
}
