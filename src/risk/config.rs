use serde::Deserialize;

/// Weights of the composite score. They must sum to 1.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub proximity: f64,
    pub velocity: f64,
    pub instability: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            proximity: 0.5,
            velocity: 0.3,
            instability: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub weights: RiskWeights,
    /// Separation at or below which proximity saturates at 100.
    pub near_field_km: f64,
    /// Separation at or beyond which proximity contributes nothing.
    pub far_field_km: f64,
    /// Closing speed that maps to a full velocity term.
    pub high_velocity_km_s: f64,
    /// Drift between successive element sets still considered consistent.
    pub drift_tolerance_km: f64,
    /// Drift at which the stability index reaches 0.
    pub drift_unstable_km: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            near_field_km: 1.0,
            far_field_km: 1_000.0,
            high_velocity_km_s: 15.0,
            drift_tolerance_km: 1.0,
            drift_unstable_km: 100.0,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), String> {
        let w = &self.weights;
        if [w.proximity, w.velocity, w.instability]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err("risk weights must be finite and non-negative".into());
        }
        let sum = w.proximity + w.velocity + w.instability;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(format!("risk weights must sum to 1, got {}", sum));
        }
        if self.near_field_km <= 0.0 || self.far_field_km <= self.near_field_km {
            return Err("risk.far_field_km must exceed a positive near_field_km".into());
        }
        if self.high_velocity_km_s <= 0.0 {
            return Err("risk.high_velocity_km_s must be positive".into());
        }
        if self.drift_tolerance_km < 0.0 || self.drift_unstable_km <= self.drift_tolerance_km {
            return Err("risk.drift_unstable_km must exceed drift_tolerance_km".into());
        }
        Ok(())
    }
}
