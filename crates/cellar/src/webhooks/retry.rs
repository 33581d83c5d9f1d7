//! Retry schedule for failed webhook deliveries.

use std::time::Duration;

/// Attempts made before a delivery is marked failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Wait after the first failed attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(60);

/// Upper bound on the wait between attempts.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60 * 60);

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again once this much time has passed.
    RetryAfter(Duration),
    /// Stop and mark the delivery failed.
    GiveUp,
}

/// Exponential backoff with a cap and a bounded number of attempts.
///
/// The wait after attempt `n` (1-based) is `base_delay * 2^(n-1)`, never more
/// than `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait after the first failure.
    pub base_delay: Duration,
    /// Cap on any single wait.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy with the default delays and `max_attempts` attempts.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Backoff after `attempts` failed attempts.
    #[must_use]
    pub fn delay_after(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(exponent))
            .min(self.max_delay)
    }

    /// Decide what follows the failure of attempt number `attempts`.
    #[must_use]
    pub fn after_failure(&self, attempts: u32) -> RetryDecision {
        if attempts >= self.max_attempts {
            RetryDecision::GiveUp
        } else {
            RetryDecision::RetryAfter(self.delay_after(attempts))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(60));
        assert_eq!(policy.delay_after(2), Duration::from_secs(120));
        assert_eq!(policy.delay_after(3), Duration::from_secs(240));
        assert_eq!(policy.delay_after(4), Duration::from_secs(480));
    }

    #[test]
    fn test_delay_capped_at_one_hour() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(7), Duration::from_secs(3600));
        assert_eq!(policy.delay_after(40), Duration::from_secs(3600));
    }

    #[test]
    fn test_gives_up_after_five_attempts() {
        let policy = RetryPolicy::default();
        for attempt in 1..5 {
            assert!(matches!(
                policy.after_failure(attempt),
                RetryDecision::RetryAfter(_)
            ));
        }
        assert_eq!(policy.after_failure(5), RetryDecision::GiveUp);
    }

    #[test]
    fn test_custom_max_attempts() {
        let policy = RetryPolicy::with_max_attempts(1);
        assert_eq!(policy.after_failure(1), RetryDecision::GiveUp);
    }
}
