mod config;
mod factors;
mod scorer;
mod types;

pub use config::RiskConfig;
pub use scorer::{assess, screen_pair};
pub use types::{Conjunction, NeighborTrack, RiskAssessment, RiskFactors, RiskLevel};
