mod error;
mod parsing;
mod source;
mod types;

#[cfg(test)]
pub mod fixtures;

pub use error::{ElementError, SourceError};
pub use parsing::{parse_catalog, MalformedRecord};
pub use source::{CatalogQuery, CelestrakSource, ElementSource, FetchOutcome};
pub use types::{OrbitClass, TrackingElementSet, EARTH_RADIUS_KM};
