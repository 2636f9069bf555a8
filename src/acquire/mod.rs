mod controller;
mod error;
mod retry;

pub use controller::{RefreshSummary, ResilienceController, Resolved};
pub use error::AcquireError;
pub use retry::RetryPolicy;
