use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::retry::classify::ErrorInfo;

/// High-level classification of an error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response received (DNS, connect, reset).
    Network,
    /// Client-side timeout.
    Timeout,
    /// Server asked us to slow down (429).
    RateLimited,
    /// Any other HTTP error status.
    Http(u16),
    /// Canceled by the caller; never retried.
    Canceled,
    /// Decode/setup failures.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

type ShouldRetry = Arc<dyn Fn(&ErrorInfo) -> bool + Send + Sync>;

/// Exponential backoff policy with a cap and a pluggable retry predicate.
///
/// Delay for 0-indexed attempt `k` is `min(initial_delay * backoff_multiplier^k, max_delay)`.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    should_retry: ShouldRetry,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl RetryPolicy {
    /// Defaults used for API calls: 3 retries, 1s doubling to at most 10s,
    /// retrying whatever the classifier marks retryable.
    pub fn standard() -> Self {
        Self::from_config(&RetryConfig::default())
    }

    /// Build from a (validated) config section.
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            initial_delay: Duration::from_millis(cfg.initial_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
            backoff_multiplier: cfg.backoff_multiplier,
            should_retry: Arc::new(|info: &ErrorInfo| info.is_retryable),
        }
    }

    /// Replace the retry predicate.
    pub fn with_should_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(&ErrorInfo) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(f);
        self
    }

    pub fn should_retry(&self, info: &ErrorInfo) -> bool {
        (self.should_retry)(info)
    }

    /// Backoff delay before the retry that follows 0-indexed `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let max_ms = self.max_delay.as_millis() as f64;
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw_ms = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exp);
        let ms = if raw_ms.is_finite() { raw_ms.min(max_ms) } else { max_ms };
        Duration::from_millis(ms.round() as u64)
    }

    /// Decide what to do after 0-indexed `attempt` failed with `info`.
    pub fn decide(&self, attempt: u32, info: &ErrorInfo) -> RetryDecision {
        if attempt >= self.max_retries {
            return RetryDecision::NoRetry;
        }
        if !self.should_retry(info) {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.delay_for(attempt))
    }
}
