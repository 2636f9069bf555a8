use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::catalog::TrackingElementSet;
use crate::propagate::{horizon, to_earth_fixed, to_geodetic, PropagationError, TrackPoint};

/// Samples `count` points of the path of `set`, `step` apart from `start`.
pub fn ground_track(
    set: &TrackingElementSet,
    start: DateTime<Utc>,
    step: Duration,
    count: usize,
) -> Result<Vec<TrackPoint>, PropagationError> {
    horizon(set, start, step, count)?
        .map(|state| {
            let state = state?;
            let geodetic = to_geodetic(&to_earth_fixed(&state)?)?;
            Ok(TrackPoint {
                timestamp: state.timestamp,
                position_km: state.position_km,
                geodetic,
            })
        })
        .collect()
}
