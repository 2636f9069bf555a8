use serde::Deserialize;
use std::time::Duration;

use crate::config::deserialize_duration;

/// Exponential backoff between catalog attempts. There is no wait after the
/// final attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_base_delay", deserialize_with = "deserialize_duration")]
    pub base_delay: Duration,
    #[serde(default = "default_factor")]
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            base_delay: default_base_delay(),
            factor: default_factor(),
        }
    }
}

fn default_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_factor() -> u32 {
    2
}

impl RetryPolicy {
    /// Delay to wait after the 1-based `attempt` failed, or `None` when it
    /// was the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.attempts {
            return None;
        }
        let multiplier = self.factor.saturating_pow(attempt - 1);
        Some(self.base_delay.saturating_mul(multiplier))
    }

    /// Sum of all backoff waits for a resolution that never succeeds.
    pub fn worst_case_backoff(&self) -> Duration {
        (1..self.attempts).filter_map(|a| self.delay_after(a)).sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.attempts == 0 {
            return Err("retry.attempts must be at least 1".into());
        }
        if self.factor == 0 {
            return Err("retry.factor must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_one_then_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_after(3), None);
        assert_eq!(policy.worst_case_backoff(), Duration::from_secs(3));
    }

    #[test]
    fn longer_policy_keeps_doubling() {
        let policy = RetryPolicy {
            attempts: 4,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_after(3), Some(Duration::from_secs(4)));
        assert_eq!(policy.worst_case_backoff(), Duration::from_secs(7));
    }

    #[test]
    fn single_attempt_never_waits() {
        let policy = RetryPolicy {
            attempts: 1,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_after(1), None);
        assert_eq!(policy.worst_case_backoff(), Duration::ZERO);
    }
}
