//! Retry and backoff policy.
//!
//! This module encapsulates error classification (network, timeout, rate
//! limiting, HTTP status) and exponential backoff decisions so that the
//! waitlist client and the cooldown controller share a consistent policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{
    classify, classify_http_status, is_retryable_kind, is_retryable_status, status_message,
    ErrorInfo, STATUS_TOO_MANY_REQUESTS,
};
pub use error::{ApiError, HttpFailure};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, run_with_retry_observed};
