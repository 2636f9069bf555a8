use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::catalog::TrackingElementSet;

/// Provenance of element data handed to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Freshness {
    Live,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub elements: TrackingElementSet,
    pub fetched_at: DateTime<Utc>,
    pub freshness: Freshness,
    /// The set this entry replaced, kept as the stability baseline.
    #[serde(default)]
    pub previous: Option<TrackingElementSet>,
}

impl CacheEntry {
    pub fn as_fallback(mut self) -> Self {
        self.freshness = Freshness::Fallback;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PutOutcome {
    Stored(CacheEntry),
    /// The candidate was not newer than what the store already holds.
    Unchanged(CacheEntry),
}

impl PutOutcome {
    pub fn entry(&self) -> &CacheEntry {
        match self {
            PutOutcome::Stored(e) | PutOutcome::Unchanged(e) => e,
        }
    }

    pub fn into_entry(self) -> CacheEntry {
        match self {
            PutOutcome::Stored(e) | PutOutcome::Unchanged(e) => e,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, PutOutcome::Stored(_))
    }
}
