//! Retry policy for idempotent Graph requests.

use std::time::{Duration, SystemTime};

use rand::Rng as _;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};

/// Exponential backoff configuration.
///
/// Delay for attempt `n` (zero-based) is `min(initial * multiplier^n, max)`,
/// plus up to 25 % jitter when enabled, still capped at `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(200),
            max: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl ExponentialBackoff {
    /// Delay before retry number `attempt + 1`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let multiplier = if self.multiplier.is_finite() && self.multiplier >= 0.0 {
            self.multiplier
        } else {
            1.0
        };
        let max_secs = self.max.as_secs_f64();
        let base = self.initial.as_secs_f64() * multiplier.powi(exponent);
        let clamped = if base.is_finite() {
            base.clamp(0.0, max_secs)
        } else {
            max_secs
        };
        let delay = Duration::from_secs_f64(clamped);

        let delay = if self.jitter {
            let factor = rand::rng().random_range(0.0..=0.25);
            delay + delay.mul_f64(factor)
        } else {
            delay
        };
        delay.min(self.max)
    }
}

/// Which requests are retried, how often, and how long to wait.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = 1 + `max_retries`).
    pub max_retries: u32,
    pub backoff: ExponentialBackoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: ExponentialBackoff::default(),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Only GET and DELETE are retried; repeating a POST could create a
    /// second invitation.
    #[must_use]
    pub fn is_retryable_method(method: &Method) -> bool {
        *method == Method::GET || *method == Method::DELETE
    }

    #[must_use]
    pub fn is_retryable_status(status: StatusCode) -> bool {
        matches!(status.as_u16(), 429 | 502 | 503 | 504)
    }

    /// Wait before the retry following `attempt`; the server's `Retry-After`
    /// wins over backoff.
    #[must_use]
    pub fn wait(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.backoff.delay(attempt))
    }
}

/// `Retry-After` as delta-seconds or an HTTP-date.
///
/// A date already in the past yields `None`, leaving the wait to backoff.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = httpdate::parse_http_date(value).ok()?;
    at.duration_since(SystemTime::now()).ok()
}
