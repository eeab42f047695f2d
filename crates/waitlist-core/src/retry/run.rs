//! Retry loop: run an async operation until success or the policy says stop.

use std::future::Future;
use std::time::Duration;

use super::classify::classify;
use super::error::ApiError;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `op` until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    run_with_retry_observed(policy, op, |_, _, _| {}).await
}

/// Like [`run_with_retry`], calling `on_retry(retry_number, &error, delay)` before
/// each backoff sleep. `retry_number` starts at 1. The observer cannot change the outcome.
pub async fn run_with_retry_observed<T, F, Fut, O>(
    policy: &RetryPolicy,
    mut op: F,
    mut on_retry: O,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    O: FnMut(u32, &ApiError, Duration),
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let info = classify(&e);
                match policy.decide(attempt, &info) {
                    RetryDecision::NoRetry => {
                        if attempt > 0 {
                            tracing::debug!(attempts = attempt + 1, error = %e, "giving up");
                        }
                        return Err(e);
                    }
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            attempt = attempt + 1,
                            delay_ms = d.as_millis() as u64,
                            error = %e,
                            "retrying after failure"
                        );
                        on_retry(attempt + 1, &e, d);
                        tokio::time::sleep(d).await;
                        attempt += 1;
                    }
                }
            }
        }
    }
}
