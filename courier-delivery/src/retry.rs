//! Retry policy for delivery operations
//!
//! Encapsulates the retry budget and backoff curve so the behavior can
//! be tested independently of the engine. The delay grows linearly with
//! the attempt number: `base * (attempt + 1)`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry configuration for transient delivery failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    ///
    /// Default: 3 (so at most 4 transmission attempts)
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base delay before the first retry, in milliseconds. Retry `n`
    /// waits `base * (n + 1)`.
    ///
    /// Default: 5000 ms
    #[serde(default = "defaults::base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            base_delay_ms: defaults::base_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Whether another retry should follow the failed attempt with the
    /// given 0-based number.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Backoff before re-running the attempt that follows the failed
    /// 0-based attempt `attempt`.
    #[must_use]
    pub const fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms * (attempt as u64 + 1))
    }

    /// Total attempts the policy permits, including the first one.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

mod defaults {
    pub const fn max_retries() -> u32 {
        3
    }

    pub const fn base_delay_ms() -> u64 {
        5000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay_ms, 5000);
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn should_retry_respects_budget() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(10));
    }

    #[test]
    fn backoff_is_linear_and_non_decreasing() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay_ms: 100,
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(300));

        let mut previous = Duration::ZERO;
        for attempt in 0..5 {
            let delay = policy.delay_for(attempt);
            assert!(delay >= previous);
            previous = delay;
        }
    }
}
