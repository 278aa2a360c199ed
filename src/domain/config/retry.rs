use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Bounded exponential backoff for relay calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    /// Cap on the whole retry loop, waits included
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_elapsed: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    /// A policy that tries exactly once
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Wait before the attempt following `attempt` (1-based):
    /// `base_delay * multiplier^(attempt - 1)`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.multiplier.powi(exponent);
        let millis = self.base_delay.as_millis() as f64 * factor;

        if millis.is_finite() && millis >= 0.0 {
            Duration::from_millis(millis.min(u64::MAX as f64) as u64)
        } else {
            Duration::MAX
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_attempts == 0 {
            return Err(DomainError::invalid_config(
                "Retry max_attempts must be at least 1",
            ));
        }

        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(DomainError::invalid_config(format!(
                "Retry multiplier must be at least 1.0, got {}",
                self.multiplier
            )));
        }

        if self.max_elapsed.is_some_and(|d| d.is_zero()) {
            return Err(DomainError::invalid_config(
                "Retry max_elapsed must be greater than zero",
            ));
        }

        Ok(())
    }
}
