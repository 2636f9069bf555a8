mod error;
mod forecast;
mod types;

pub use error::TrendError;
pub use forecast::{forecast, TrendConfig};
pub use types::{TrendPoint, TrendSeries};
