use chrono::{DateTime, Utc};
use serde::Deserialize;
use sgp4::{Constants, Elements};
use std::time::Duration;

use crate::catalog::{TrackingElementSet, EARTH_RADIUS_KM};
use crate::config::deserialize_duration;
use crate::propagate::{Frame, PropagationError, Propagated, StateVector};

#[derive(Debug, Clone, Deserialize)]
pub struct PropagationConfig {
    /// Distance from the element epoch beyond which results are flagged as
    /// degraded.
    #[serde(default = "default_validity_window", deserialize_with = "deserialize_duration")]
    pub validity_window: Duration,
    /// Sampling interval of the risk horizon.
    #[serde(default = "default_step", deserialize_with = "deserialize_duration")]
    pub step: Duration,
    #[serde(default = "default_horizon", deserialize_with = "deserialize_duration")]
    pub horizon: Duration,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            validity_window: default_validity_window(),
            step: default_step(),
            horizon: default_horizon(),
        }
    }
}

fn default_validity_window() -> Duration {
    Duration::from_secs(5 * 86_400)
}

fn default_step() -> Duration {
    Duration::from_secs(30)
}

fn default_horizon() -> Duration {
    Duration::from_secs(90 * 60)
}

impl PropagationConfig {
    pub fn sample_count(&self) -> usize {
        (self.horizon.as_millis() / self.step.as_millis().max(1)).max(1) as usize
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.step.as_millis() == 0 {
            return Err("propagation.step must be positive".into());
        }
        if self.horizon < self.step {
            return Err("propagation.horizon must cover at least one step".into());
        }
        Ok(())
    }
}

/// SGP4 state prepared once per element set.
pub(crate) struct Sgp4Model {
    catalog_id: u32,
    elements: Elements,
    constants: Constants,
}

impl Sgp4Model {
    pub(crate) fn new(set: &TrackingElementSet) -> Result<Self, PropagationError> {
        let catalog_id = set.catalog_id;
        if !(0.0..1.0).contains(&set.eccentricity) {
            return Err(PropagationError::OpenOrbit {
                catalog_id,
                eccentricity: set.eccentricity,
            });
        }
        if !set.mean_motion_rev_day.is_finite() || set.mean_motion_rev_day <= 0.0 {
            return Err(PropagationError::MeanMotion {
                catalog_id,
                mean_motion: set.mean_motion_rev_day,
            });
        }

        let elements = set.to_sgp4().map_err(|e| PropagationError::Elements {
            catalog_id,
            message: e.to_string(),
        })?;
        let constants =
            Constants::from_elements(&elements).map_err(|e| PropagationError::Elements {
                catalog_id,
                message: e.to_string(),
            })?;

        Ok(Self {
            catalog_id,
            elements,
            constants,
        })
    }

    pub(crate) fn state_at(&self, timestamp: DateTime<Utc>) -> Result<StateVector, PropagationError> {
        let catalog_id = self.catalog_id;
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .map_err(|e| PropagationError::Sgp4 {
                catalog_id,
                message: e.to_string(),
            })?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| PropagationError::Sgp4 {
                catalog_id,
                message: e.to_string(),
            })?;

        let state = StateVector {
            catalog_id,
            timestamp,
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
            frame: Frame::Teme,
        };
        if !state.is_finite() {
            return Err(PropagationError::NonFinite { catalog_id });
        }
        Ok(state)
    }
}

/// TEME state of `set` at `timestamp`.
pub fn state_at(
    set: &TrackingElementSet,
    timestamp: DateTime<Utc>,
) -> Result<StateVector, PropagationError> {
    Sgp4Model::new(set)?.state_at(timestamp)
}

/// TEME state of `set` at `target`, flagged when `target` lies outside the
/// configured validity window around the element epoch.
pub fn propagate(
    set: &TrackingElementSet,
    target: DateTime<Utc>,
    config: &PropagationConfig,
) -> Result<Propagated, PropagationError> {
    let state = state_at(set, target)?;
    let offset = (target - set.epoch).abs();
    let degraded_accuracy = offset
        .to_std()
        .map(|offset| offset > config.validity_window)
        .unwrap_or(true);

    if state.radius_km() < EARTH_RADIUS_KM {
        log::warn!(
            "Catalog {}: state at {} lies below the surface, object has likely decayed",
            set.catalog_id,
            target
        );
    }
    if degraded_accuracy {
        log::debug!(
            "Catalog {}: {} is {} h from epoch, accuracy degraded",
            set.catalog_id,
            target,
            offset.num_hours()
        );
    }

    Ok(Propagated {
        state,
        degraded_accuracy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use chrono::Duration as TimeDelta;

    #[test]
    fn repeated_calls_are_identical() {
        let set = fixtures::iss();
        let target = set.epoch + TimeDelta::minutes(37);
        let a = state_at(&set, target).unwrap();
        let b = state_at(&set, target).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn low_orbit_state_is_physical() {
        let set = fixtures::iss();
        let state = state_at(&set, set.epoch + TimeDelta::hours(2)).unwrap();
        assert_eq!(state.frame, Frame::Teme);
        assert_eq!(state.catalog_id, 25544);
        assert!(state.radius_km() > 6_700.0 && state.radius_km() < 6_850.0);
        assert!(state.speed_km_s() > 7.5 && state.speed_km_s() < 7.8);
    }

    #[test]
    fn far_targets_are_flagged_not_refused() {
        let set = fixtures::iss();
        let config = PropagationConfig::default();

        let near = propagate(&set, set.epoch + TimeDelta::days(2), &config).unwrap();
        assert!(!near.degraded_accuracy);

        let before = propagate(&set, set.epoch - TimeDelta::days(1), &config).unwrap();
        assert!(!before.degraded_accuracy);

        let far = propagate(&set, set.epoch + TimeDelta::days(9), &config).unwrap();
        assert!(far.degraded_accuracy);
        assert!(far.state.is_finite());
    }

    #[test]
    fn open_orbit_is_a_propagation_error() {
        let err = state_at(&fixtures::hyperbolic(), fixtures::iss().epoch).unwrap_err();
        assert!(matches!(
            err,
            PropagationError::OpenOrbit {
                catalog_id: 90009,
                ..
            }
        ));
    }

    #[test]
    fn non_finite_mean_motion_is_rejected() {
        let mut set = fixtures::iss();
        set.mean_motion_rev_day = f64::NAN;
        let err = state_at(&set, set.epoch).unwrap_err();
        assert!(matches!(err, PropagationError::MeanMotion { .. }));
    }

    #[test]
    fn default_horizon_samples_ninety_minutes_every_thirty_seconds() {
        let config = PropagationConfig::default();
        assert_eq!(config.sample_count(), 180);
    }
}
