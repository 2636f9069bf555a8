use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Reference frame of a state vector. SGP4 output is TEME (quasi-inertial);
/// ECEF rotates with the Earth and is the only frame that maps to
/// latitude/longitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Frame {
    Teme,
    Ecef,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub catalog_id: u32,
    pub timestamp: DateTime<Utc>,
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    pub frame: Frame,
}

impl StateVector {
    pub fn radius_km(&self) -> f64 {
        norm(self.position_km)
    }

    pub fn speed_km_s(&self) -> f64 {
        norm(self.velocity_km_s)
    }

    pub fn distance_km(&self, other: &StateVector) -> f64 {
        norm(sub(self.position_km, other.position_km))
    }

    pub fn relative_speed_km_s(&self, other: &StateVector) -> f64 {
        norm(sub(self.velocity_km_s, other.velocity_km_s))
    }

    pub fn is_finite(&self) -> bool {
        self.position_km
            .iter()
            .chain(self.velocity_km_s.iter())
            .all(|v| v.is_finite())
    }
}

/// State at a requested time plus whether the request fell outside the
/// window in which SGP4 accuracy holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Propagated {
    pub state: StateVector,
    pub degraded_accuracy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// One sample of an object's path: inertial position and the point beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackPoint {
    pub timestamp: DateTime<Utc>,
    pub position_km: [f64; 3],
    pub geodetic: GeodeticPosition,
}
