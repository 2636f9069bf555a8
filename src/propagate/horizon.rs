use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::catalog::TrackingElementSet;
use crate::propagate::propagation::Sgp4Model;
use crate::propagate::{PropagationError, StateVector};

/// Lazily propagated states at `start + k * step` for `k` in `0..count`.
///
/// Cloning yields an independent cursor at the same position, so a clone
/// taken before iterating replays every sample.
#[derive(Clone)]
pub struct Horizon {
    model: Arc<Sgp4Model>,
    start: DateTime<Utc>,
    step: Duration,
    count: usize,
    index: usize,
}

pub fn horizon(
    set: &TrackingElementSet,
    start: DateTime<Utc>,
    step: std::time::Duration,
    count: usize,
) -> Result<Horizon, PropagationError> {
    Ok(Horizon {
        model: Arc::new(Sgp4Model::new(set)?),
        start,
        step: Duration::milliseconds(step.as_millis() as i64),
        count,
        index: 0,
    })
}

impl Horizon {
    pub fn timestamp(&self, index: usize) -> DateTime<Utc> {
        self.start + self.step * index as i32
    }
}

impl Iterator for Horizon {
    type Item = Result<StateVector, PropagationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let timestamp = self.timestamp(self.index);
        self.index += 1;
        Some(self.model.state_at(timestamp))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Horizon {}
