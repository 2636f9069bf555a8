mod error;
mod store;
mod types;

pub use error::StoreError;
pub use store::ElementStore;
pub use types::{CacheEntry, Freshness, PutOutcome};
