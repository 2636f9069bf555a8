use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::catalog::ElementError;

pub const EARTH_RADIUS_KM: f64 = 6378.137;
pub const MU_EARTH_KM3_S2: f64 = 398_600.4418;

const LEO_CEILING_KM: f64 = 2_000.0;
const GEO_BAND_KM: (f64, f64) = (35_000.0, 36_600.0);
const HEO_MIN_ECCENTRICITY: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum OrbitClass {
    Leo,
    Meo,
    Geo,
    Heo,
}

impl OrbitClass {
    pub fn classify(mean_motion_rev_day: f64, eccentricity: f64) -> Self {
        let a = semi_major_axis_km(mean_motion_rev_day);
        let apogee = a * (1.0 + eccentricity) - EARTH_RADIUS_KM;
        let mean_altitude = a - EARTH_RADIUS_KM;

        if apogee < LEO_CEILING_KM {
            OrbitClass::Leo
        } else if mean_altitude >= GEO_BAND_KM.0 && mean_altitude <= GEO_BAND_KM.1 && eccentricity < 0.1
        {
            OrbitClass::Geo
        } else if eccentricity >= HEO_MIN_ECCENTRICITY {
            OrbitClass::Heo
        } else {
            OrbitClass::Meo
        }
    }
}

/// Semi-major axis from Kepler's third law.
pub fn semi_major_axis_km(mean_motion_rev_day: f64) -> f64 {
    let n_rad_s = mean_motion_rev_day * std::f64::consts::TAU / 86_400.0;
    (MU_EARTH_KM3_S2 / (n_rad_s * n_rad_s)).cbrt()
}

/// One object's mean orbital elements at a reference epoch, as published in
/// a two-line element set. The raw lines are kept so the set can be handed
/// back to the SGP4 model unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingElementSet {
    pub catalog_id: u32,
    pub name: String,
    pub orbit_class: OrbitClass,
    pub epoch: DateTime<Utc>,
    pub inclination_deg: f64,
    pub eccentricity: f64,
    pub mean_motion_rev_day: f64,
    pub raan_deg: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    pub drag_term: f64,
    pub line1: String,
    pub line2: String,
}

impl TrackingElementSet {
    pub fn from_tle(name: Option<String>, line1: &str, line2: &str) -> Result<Self, ElementError> {
        let elements = sgp4::Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())?;

        if !(0.0..1.0).contains(&elements.eccentricity) {
            return Err(ElementError::Eccentricity(elements.eccentricity));
        }
        if !elements.mean_motion.is_finite() || elements.mean_motion <= 0.0 {
            return Err(ElementError::MeanMotion(elements.mean_motion));
        }
        for (field, value) in [
            ("inclination", elements.inclination),
            ("right_ascension", elements.right_ascension),
            ("argument_of_perigee", elements.argument_of_perigee),
            ("mean_anomaly", elements.mean_anomaly),
            ("drag_term", elements.drag_term),
        ] {
            if !value.is_finite() {
                return Err(ElementError::NonFinite(field));
            }
        }

        let catalog_id = elements.norad_id as u32;
        let name = elements
            .object_name
            .clone()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("NORAD {}", catalog_id));

        Ok(Self {
            catalog_id,
            name,
            orbit_class: OrbitClass::classify(elements.mean_motion, elements.eccentricity),
            epoch: elements.datetime.and_utc(),
            inclination_deg: elements.inclination,
            eccentricity: elements.eccentricity,
            mean_motion_rev_day: elements.mean_motion,
            raan_deg: elements.right_ascension,
            arg_perigee_deg: elements.argument_of_perigee,
            mean_anomaly_deg: elements.mean_anomaly,
            drag_term: elements.drag_term,
            line1: line1.trim().to_string(),
            line2: line2.trim().to_string(),
        })
    }

    /// Re-parses the raw lines into the form the SGP4 model consumes.
    pub fn to_sgp4(&self) -> Result<sgp4::Elements, sgp4::TleError> {
        sgp4::Elements::from_tle(
            Some(self.name.clone()),
            self.line1.as_bytes(),
            self.line2.as_bytes(),
        )
    }

    pub fn period_minutes(&self) -> f64 {
        1440.0 / self.mean_motion_rev_day
    }

    pub fn apogee_km(&self) -> f64 {
        semi_major_axis_km(self.mean_motion_rev_day) * (1.0 + self.eccentricity) - EARTH_RADIUS_KM
    }

    pub fn perigee_km(&self) -> f64 {
        semi_major_axis_km(self.mean_motion_rev_day) * (1.0 - self.eccentricity) - EARTH_RADIUS_KM
    }
}
