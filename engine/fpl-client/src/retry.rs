//! Retry policy and response classification.
//!
//! Classification is a pure function from status code to outcome category;
//! the retry loop in the client acts on the tag, never on exception types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a response status is handled by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx; the body is usable.
    Success,
    /// Transient upstream trouble; retry with backoff.
    Retryable,
    /// 401; re-authenticate once, then continue the attempt budget.
    Unauthorized,
    /// Any other 4xx; return to the caller immediately.
    Terminal,
}

/// Map an HTTP status to its retry category.
pub fn classify(status: u16) -> Outcome {
    match status {
        200..=299 => Outcome::Success,
        401 => Outcome::Unauthorized,
        429 | 500 | 502 | 503 => Outcome::Retryable,
        _ => Outcome::Terminal,
    }
}

/// Exponential backoff schedule for transient failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Tighter budget used for the transfer-submission POST.
    pub fn for_transfers() -> Self {
        Self { max_attempts: 3, ..Self::default() }
    }

    /// Delay to sleep after the given 1-based attempt fails. Doubles per
    /// attempt, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay.saturating_mul(1u32 << exponent).min(self.max_delay)
    }
}
