use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::catalog::TrackingElementSet;
use crate::propagate::{horizon, state_at, PropagationConfig, PropagationError, StateVector};
use crate::risk::factors::{closest_approach, composite_score, stability_index, NEUTRAL_STABILITY};
use crate::risk::{Conjunction, NeighborTrack, RiskAssessment, RiskConfig, RiskFactors, RiskLevel};
use crate::store::Freshness;

/// Scores a subject track against already sampled neighbor tracks.
pub fn score(
    catalog_id: u32,
    subject: &[StateVector],
    neighbors: &[NeighborTrack],
    stability_index: f64,
    freshness: Freshness,
    computed_at: DateTime<Utc>,
    config: &RiskConfig,
) -> RiskAssessment {
    let approach = closest_approach(subject, neighbors);
    let factors = RiskFactors {
        min_separation_km: approach.map(|a| a.separation_km),
        closing_speed_km_s: approach.map(|a| a.closing_speed_km_s),
        stability_index,
        nearest_neighbor: approach.map(|a| a.neighbor_id),
        closest_approach_at: approach.map(|a| a.at),
    };
    let score = composite_score(&factors, config);

    RiskAssessment {
        catalog_id,
        score,
        level: RiskLevel::from_score(score),
        computed_at,
        factors,
        freshness,
    }
}

/// Propagates the subject and every neighbor over the configured horizon
/// starting at `start` and scores the result.
///
/// Only a failure to propagate the subject fails the assessment. Neighbors
/// that cannot be propagated are left out, and an unusable previous set
/// yields the neutral stability index.
pub fn assess(
    subject: &TrackingElementSet,
    previous: Option<&TrackingElementSet>,
    neighbors: &[TrackingElementSet],
    freshness: Freshness,
    start: DateTime<Utc>,
    propagation: &PropagationConfig,
    config: &RiskConfig,
) -> Result<RiskAssessment, PropagationError> {
    let count = propagation.sample_count();
    let subject_states = horizon(subject, start, propagation.step, count)?
        .collect::<Result<Vec<_>, _>>()?;

    let tracks: Vec<NeighborTrack> = neighbors
        .iter()
        .filter(|n| n.catalog_id != subject.catalog_id)
        .filter_map(|n| {
            let states = horizon(n, start, propagation.step, count)
                .and_then(|h| h.collect::<Result<Vec<_>, _>>());
            match states {
                Ok(states) => Some(NeighborTrack {
                    catalog_id: n.catalog_id,
                    states,
                }),
                Err(e) => {
                    warn!(
                        "Catalog {}: skipping neighbor {}: {}",
                        subject.catalog_id, n.catalog_id, e
                    );
                    None
                }
            }
        })
        .collect();

    let stability = subject_stability(subject, previous, config);

    let assessment = score(
        subject.catalog_id,
        &subject_states,
        &tracks,
        stability,
        freshness,
        start,
        config,
    );
    debug!(
        "Catalog {}: score {} ({}) against {} neighbors",
        assessment.catalog_id,
        assessment.score,
        assessment.level,
        tracks.len()
    );
    Ok(assessment)
}

/// Finds the closest approach of `secondary` to `primary` over the configured
/// horizon from `start`. Unlike `assess`, a secondary that cannot be
/// propagated fails the screening.
pub fn screen_pair(
    primary: &TrackingElementSet,
    secondary: &TrackingElementSet,
    start: DateTime<Utc>,
    propagation: &PropagationConfig,
) -> Result<Conjunction, PropagationError> {
    let count = propagation.sample_count();
    let track = |set: &TrackingElementSet| {
        horizon(set, start, propagation.step, count)?.collect::<Result<Vec<_>, _>>()
    };
    let primary_states = track(primary)?;
    let neighbor = NeighborTrack {
        catalog_id: secondary.catalog_id,
        states: track(secondary)?,
    };

    let approach = closest_approach(&primary_states, std::slice::from_ref(&neighbor)).ok_or(
        PropagationError::EmptyHorizon {
            catalog_id: primary.catalog_id,
        },
    )?;
    let min_distance_km = (approach.separation_km * 100.0).round() / 100.0;
    debug!(
        "Catalogs {} and {}: {} km at {}",
        primary.catalog_id, secondary.catalog_id, min_distance_km, approach.at
    );

    Ok(Conjunction {
        primary: primary.catalog_id,
        secondary: secondary.catalog_id,
        min_distance_km,
        closest_approach_at: approach.at,
        relative_speed_km_s: approach.closing_speed_km_s,
        level: RiskLevel::from_separation(min_distance_km),
    })
}

/// Compares the current set at its own epoch with the previous set
/// propagated to the same instant.
fn subject_stability(
    subject: &TrackingElementSet,
    previous: Option<&TrackingElementSet>,
    config: &RiskConfig,
) -> f64 {
    let current = match state_at(subject, subject.epoch) {
        Ok(state) => state,
        Err(e) => {
            warn!("Catalog {}: no stability baseline: {}", subject.catalog_id, e);
            return NEUTRAL_STABILITY;
        }
    };

    let predicted = previous.and_then(|prev| match state_at(prev, subject.epoch) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(
                "Catalog {}: previous elements unusable: {}",
                subject.catalog_id, e
            );
            None
        }
    });

    stability_index(&current, predicted.as_ref(), config)
}
