use crate::Error;
use std::time::Duration;

/// Internal decision for how to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Capped exponential backoff between attempts of one logical call.
///
/// The delay before retry `n` (0-based) is `base_delay * 2^n`, clamped to
/// `max_delay`. A `Retry-After` hint on a rate-limit response replaces the
/// computed delay, subject to the same cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// No waiting between attempts. Mostly useful in tests.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub(crate) fn backoff_delay(&self, retry: u32, retry_after_ms: Option<u64>) -> Duration {
        let computed = if self.base_delay.is_zero() {
            Duration::ZERO
        } else {
            let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
            self.base_delay.saturating_mul(factor)
        };
        let chosen = retry_after_ms
            .map(Duration::from_millis)
            .unwrap_or(computed);
        chosen.min(self.max_delay)
    }
}

/// Retry engine for a single logical call.
///
/// `attempt` counts completed attempts that failed; the call may make at most
/// `max_retries + 1` attempts in total.
pub(crate) struct PolicyEngine {
    pub max_retries: u32,
    pub policy: RetryPolicy,
}

impl PolicyEngine {
    pub fn new(max_retries: u32, policy: RetryPolicy) -> Self {
        Self {
            max_retries,
            policy,
        }
    }

    /// Decide what to do after attempt number `attempt` (0-based) failed with `err`.
    pub fn decide(&self, attempt: u32, err: &Error) -> Decision {
        if !err.is_retryable() || attempt >= self.max_retries {
            return Decision::Fail;
        }
        Decision::Retry {
            delay: self.policy.backoff_delay(attempt, err.retry_after_ms()),
        }
    }
}
