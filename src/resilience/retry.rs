//! Retry Logic
//!
//! Exponential backoff for idempotent requests. No jitter: the ladder is
//! `base * 2^(k-1)` before retry `k`.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::{ApiError, ErrorKind};
use crate::types::DEFAULT_RETRY_BASE_DELAY;

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for a single computed backoff.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_RETRY_BASE_DELAY,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub fn with_base_delay(base_delay: Duration) -> Self {
        Self {
            base_delay,
            ..Self::default()
        }
    }

    /// Backoff before retry `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Delay before retry `retry` after `error`.
    ///
    /// For RATE_LIMITED the server's `Retry-After` wins when it is longer than
    /// the computed backoff. It is not capped by `max_delay`.
    pub fn delay_for(&self, error: &ApiError, retry: u32, now: DateTime<Utc>) -> Duration {
        let backoff = self.backoff(retry);
        if error.code() != ErrorKind::RateLimited {
            return backoff;
        }
        let server = error
            .retry_after()
            .map(|r| r.delay_from(now))
            .unwrap_or(Duration::ZERO);
        backoff.max(server)
    }
}

/// Whether `error` on attempt number `attempt` (1-based) may be retried.
pub fn should_retry(error: &ApiError, idempotent: bool, attempt: u32, retries: u32) -> bool {
    idempotent && attempt <= retries && error.is_transient()
}
