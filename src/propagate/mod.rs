mod error;
mod frames;
mod horizon;
mod propagation;
mod track;
mod types;

pub use error::PropagationError;
pub use frames::{to_earth_fixed, to_geodetic};
pub use horizon::horizon;
pub use propagation::{propagate, state_at, PropagationConfig};
pub use track::ground_track;
pub use types::{Frame, GeodeticPosition, Propagated, StateVector, TrackPoint};
