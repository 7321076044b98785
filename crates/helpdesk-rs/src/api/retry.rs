//! Retry budget and backoff for failed model invocations.
//!
//! Every [`AdapterError`] is retried up to `max_retries` extra times within
//! the same round. Transient failures (network, timeout, 429, 5xx) wait with
//! exponential backoff first; failures caused by what the model produced are
//! retried at once with a clarified prompt.

use std::time::Duration;

use crate::error::AdapterError;

/// Default number of additional attempts after a failed model call.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (0 = fail on the first error).
    pub max_retries: u32,
    /// Initial delay before the first transient retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier (typically 2.0 for exponential backoff).
    pub multiplier: f64,
    /// Whether to add jitter to prevent thundering herd.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a config with the given number of retries. Uses sensible defaults.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..Default::default()
        }
    }

    /// Retries without any waiting, for tests and offline models.
    pub fn immediate(retries: u32) -> Self {
        Self {
            max_retries: retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Calculate the backoff delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        if self.jitter {
            // Deterministic jitter keyed on the attempt number.
            let jitter_factor = match attempt % 4 {
                0 => 0.75,
                1 => 0.90,
                2 => 0.60,
                _ => 0.85,
            };
            Duration::from_secs_f64(capped * jitter_factor)
        } else {
            Duration::from_secs_f64(capped)
        }
    }

    /// How long to wait before retrying after `error`.
    pub fn delay_for(&self, error: &AdapterError, attempt: u32) -> Duration {
        if error.is_transient() {
            self.delay_for_attempt(attempt)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_two_retries() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn delay_increases_exponentially() {
        let config = RetryConfig {
            jitter: false,
            ..RetryConfig::with_retries(5)
        };
        let d0 = config.delay_for_attempt(0);
        let d1 = config.delay_for_attempt(1);
        let d2 = config.delay_for_attempt(2);

        assert!(d1 > d0, "d1={d1:?} should be > d0={d0:?}");
        assert!(d2 > d1, "d2={d2:?} should be > d1={d1:?}");
    }

    #[test]
    fn delay_capped_at_max() {
        let config = RetryConfig {
            jitter: false,
            max_delay: Duration::from_secs(2),
            ..RetryConfig::with_retries(10)
        };
        assert!(config.delay_for_attempt(10) <= Duration::from_secs(2));
    }

    #[test]
    fn only_transient_errors_back_off() {
        let config = RetryConfig::default();
        let transient = AdapterError::Http {
            status: 503,
            body: String::new(),
        };
        assert!(config.delay_for(&transient, 0) > Duration::ZERO);
        assert_eq!(
            config.delay_for(&AdapterError::EmptyResponse, 0),
            Duration::ZERO
        );
    }

    #[test]
    fn immediate_never_waits() {
        let config = RetryConfig::immediate(2);
        let err = AdapterError::Transport("reset".into());
        assert_eq!(config.delay_for(&err, 1), Duration::ZERO);
    }
}
