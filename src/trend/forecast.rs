use chrono::Days;
use serde::Deserialize;

use crate::risk::RiskAssessment;
use crate::trend::{TrendError, TrendPoint, TrendSeries};

pub const FORECAST_DAYS: u64 = 7;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Minimum history length for Holt smoothing.
    pub smoothing_window: usize,
    /// Level smoothing factor.
    pub alpha: f64,
    /// Trend smoothing factor.
    pub beta: f64,
    /// Days of daily assessments gathered as forecast input.
    pub history_days: u32,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 3,
            alpha: 0.5,
            beta: 0.3,
            history_days: 7,
        }
    }
}

impl TrendConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.smoothing_window < 2 {
            return Err("trend.smoothing_window must be at least 2".into());
        }
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(format!("trend.{} must be in (0, 1], got {}", name, value));
            }
        }
        if self.history_days == 0 {
            return Err("trend.history_days must be at least 1".into());
        }
        Ok(())
    }
}

/// Extrapolates the scores of `history`, taken in the given order, into
/// seven daily points after the date of its last entry.
pub fn forecast(history: &[RiskAssessment], config: &TrendConfig) -> Result<TrendSeries, TrendError> {
    let last = history.last().ok_or(TrendError::InsufficientHistory)?;
    let scores: Vec<f64> = history.iter().map(|a| a.score).collect();

    let (level, slope) = match scores.len() {
        1 => (scores[0], 0.0),
        n if n < config.smoothing_window => (scores[n - 1], scores[n - 1] - scores[n - 2]),
        _ => holt(&scores, config.alpha, config.beta),
    };

    let start = last.computed_at.date_naive();
    let points = (1..=FORECAST_DAYS)
        .filter_map(|h| {
            let date = start.checked_add_days(Days::new(h))?;
            let score = (level + slope * h as f64).clamp(0.0, 100.0);
            Some(TrendPoint {
                date,
                score: (score * 100.0).round() / 100.0,
            })
        })
        .collect();

    Ok(TrendSeries {
        catalog_id: last.catalog_id,
        points,
    })
}

/// Final level and trend of Holt's linear method, seeded with the first
/// observation and the first difference.
fn holt(scores: &[f64], alpha: f64, beta: f64) -> (f64, f64) {
    let mut level = scores[0];
    let mut trend = scores[1] - scores[0];
    for &x in &scores[1..] {
        let prev_level = level;
        level = alpha * x + (1.0 - alpha) * (level + trend);
        trend = beta * (level - prev_level) + (1.0 - beta) * trend;
    }
    (level, trend)
}
