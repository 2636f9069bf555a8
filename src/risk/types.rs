use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::propagate::StateVector;
use crate::store::Freshness;

pub const MEDIUM_THRESHOLD: f64 = 33.0;
pub const HIGH_THRESHOLD: f64 = 66.0;

/// Pairwise screening levels by minimum separation.
pub const HIGH_SEPARATION_KM: f64 = 100.0;
pub const MEDIUM_SEPARATION_KM: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_THRESHOLD {
            RiskLevel::High
        } else if score >= MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn from_separation(separation_km: f64) -> Self {
        if separation_km < HIGH_SEPARATION_KM {
            RiskLevel::High
        } else if separation_km < MEDIUM_SEPARATION_KM {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Inputs of the composite score, also reported as its explanation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    /// `None` when there was no neighbor to compare against.
    pub min_separation_km: Option<f64>,
    pub closing_speed_km_s: Option<f64>,
    pub stability_index: f64,
    pub nearest_neighbor: Option<u32>,
    pub closest_approach_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub catalog_id: u32,
    pub score: f64,
    pub level: RiskLevel,
    pub computed_at: DateTime<Utc>,
    pub factors: RiskFactors,
    /// Provenance of the subject's element set.
    pub freshness: Freshness,
}

/// A neighbor's states sampled on the same horizon as the subject.
#[derive(Debug, Clone)]
pub struct NeighborTrack {
    pub catalog_id: u32,
    pub states: Vec<StateVector>,
}

/// Closest approach of two objects over one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conjunction {
    pub primary: u32,
    pub secondary: u32,
    pub min_distance_km: f64,
    pub closest_approach_at: DateTime<Utc>,
    pub relative_speed_km_s: f64,
    pub level: RiskLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separation_levels_switch_at_the_thresholds() {
        assert_eq!(RiskLevel::from_separation(0.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_separation(99.9), RiskLevel::High);
        assert_eq!(RiskLevel::from_separation(100.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_separation(999.9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_separation(1000.0), RiskLevel::Low);
    }
}
