use chrono::{DateTime, Utc};

use crate::propagate::StateVector;
use crate::risk::{NeighborTrack, RiskConfig, RiskFactors};

pub const NEUTRAL_STABILITY: f64 = 50.0;

/// Closest sampled approach between the subject and any neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Approach {
    pub neighbor_id: u32,
    pub separation_km: f64,
    pub closing_speed_km_s: f64,
    pub at: DateTime<Utc>,
}

/// Compares samples pairwise by step; samples whose timestamps disagree are
/// ignored.
pub fn closest_approach(subject: &[StateVector], neighbors: &[NeighborTrack]) -> Option<Approach> {
    let mut best: Option<Approach> = None;

    for neighbor in neighbors {
        for (own, other) in subject.iter().zip(&neighbor.states) {
            if own.timestamp != other.timestamp || own.frame != other.frame {
                continue;
            }
            let separation_km = own.distance_km(other);
            if best.map_or(true, |b| separation_km < b.separation_km) {
                best = Some(Approach {
                    neighbor_id: neighbor.catalog_id,
                    separation_km,
                    closing_speed_km_s: own.relative_speed_km_s(other),
                    at: own.timestamp,
                });
            }
        }
    }

    best
}

/// 100 when the state predicted from the previous element set agrees with
/// the current one, falling linearly to 0 as the drift grows.
pub fn stability_index(
    current: &StateVector,
    predicted_from_previous: Option<&StateVector>,
    config: &RiskConfig,
) -> f64 {
    let Some(predicted) = predicted_from_previous else {
        return NEUTRAL_STABILITY;
    };

    let drift = current.distance_km(predicted);
    if drift <= config.drift_tolerance_km {
        100.0
    } else if drift >= config.drift_unstable_km {
        0.0
    } else {
        100.0 * (config.drift_unstable_km - drift)
            / (config.drift_unstable_km - config.drift_tolerance_km)
    }
}

/// Log-scaled inverse of the minimum separation.
pub fn proximity_term(factors: &RiskFactors, config: &RiskConfig) -> f64 {
    match factors.min_separation_km {
        None => 0.0,
        Some(d) if d <= config.near_field_km => 100.0,
        Some(d) if d >= config.far_field_km => 0.0,
        Some(d) => {
            let span = config.far_field_km.ln() - config.near_field_km.ln();
            100.0 * (config.far_field_km.ln() - d.ln()) / span
        }
    }
}

pub fn velocity_term(factors: &RiskFactors, config: &RiskConfig) -> f64 {
    factors
        .closing_speed_km_s
        .map_or(0.0, |v| (100.0 * v / config.high_velocity_km_s).clamp(0.0, 100.0))
}

pub fn instability_term(factors: &RiskFactors) -> f64 {
    100.0 - factors.stability_index.clamp(0.0, 100.0)
}

pub fn composite_score(factors: &RiskFactors, config: &RiskConfig) -> f64 {
    let w = &config.weights;
    let raw = w.proximity * proximity_term(factors, config)
        + w.velocity * velocity_term(factors, config)
        + w.instability * instability_term(factors);
    round2(raw.clamp(0.0, 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
