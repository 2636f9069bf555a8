use crate::propagate::{Frame, GeodeticPosition, PropagationError, StateVector};

const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

// WGS-84
const WGS84_A_KM: f64 = 6378.137;
const WGS84_E2: f64 = 0.006_694_379_990_14;

/// Rotates a TEME state into the Earth-fixed frame using Greenwich mean
/// sidereal time at the state's timestamp.
pub fn to_earth_fixed(state: &StateVector) -> Result<StateVector, PropagationError> {
    expect_frame(state, Frame::Teme)?;

    let gmst = sidereal_time(state);
    Ok(StateVector {
        position_km: teme_to_ecef_position(state.position_km, gmst),
        velocity_km_s: teme_to_ecef_velocity(state.position_km, state.velocity_km_s, gmst),
        frame: Frame::Ecef,
        ..*state
    })
}

/// Geodetic latitude, longitude and altitude of an Earth-fixed state.
pub fn to_geodetic(state: &StateVector) -> Result<GeodeticPosition, PropagationError> {
    expect_frame(state, Frame::Ecef)?;
    Ok(ecef_to_geodetic(state.position_km))
}

fn expect_frame(state: &StateVector, expected: Frame) -> Result<(), PropagationError> {
    if state.frame != expected {
        return Err(PropagationError::Frame {
            expected,
            actual: state.frame,
        });
    }
    Ok(())
}

fn sidereal_time(state: &StateVector) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(
        &state.timestamp.naive_utc(),
    ))
}

fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = teme_to_ecef_position(vel_teme, gmst);
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

/// Iterative WGS-84 inversion; converges to sub-millimetre in a few rounds
/// for orbital altitudes.
fn ecef_to_geodetic(pos: [f64; 3]) -> GeodeticPosition {
    let [x, y, z] = pos;
    let p = (x * x + y * y).sqrt();
    let longitude = y.atan2(x);

    let mut latitude = z.atan2(p * (1.0 - WGS84_E2));
    let mut altitude = 0.0;
    for _ in 0..6 {
        let sin_lat = latitude.sin();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        altitude = if latitude.cos().abs() > 1e-9 {
            p / latitude.cos() - n
        } else {
            z.abs() / sin_lat.abs() - n * (1.0 - WGS84_E2)
        };
        latitude = z.atan2(p * (1.0 - WGS84_E2 * n / (n + altitude)));
    }

    GeodeticPosition {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: (longitude.to_degrees() + 180.0).rem_euclid(360.0) - 180.0,
        altitude_km: altitude,
    }
}
