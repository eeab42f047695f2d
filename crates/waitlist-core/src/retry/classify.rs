//! Classify API failures into user-facing messages and retry kinds.

use crate::retry::error::{ApiError, HttpFailure};
use crate::retry::policy::ErrorKind;

pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

const MSG_NETWORK: &str = "Network error. Please check your internet connection and try again.";
const MSG_TIMEOUT: &str = "Request timed out. Please try again.";
const MSG_CANCELED: &str = "Request was canceled.";
const MSG_UNEXPECTED: &str = "An unexpected error occurred. Please try again.";
const MSG_GENERIC: &str = "Something went wrong. Please try again.";

/// Everything a caller needs to know about a failed call. Derived, never stored
/// beyond the lifetime of the state that displays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    /// User-facing; never contains raw transport detail.
    pub message: String,
    pub status_code: Option<u16>,
    pub is_network_error: bool,
    pub is_timeout_error: bool,
    pub is_rate_limit_error: bool,
    pub is_retryable: bool,
    /// Only set for 429 responses carrying a numeric `retry-after`.
    pub retry_after_seconds: Option<u64>,
}

/// Classify an HTTP status code.
pub fn classify_http_status(status: u16) -> ErrorKind {
    match status {
        STATUS_TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        _ => ErrorKind::Http(status),
    }
}

/// Network errors, timeouts, 5xx and 429 are worth another attempt.
pub fn is_retryable_kind(kind: ErrorKind) -> bool {
    match kind {
        ErrorKind::Network | ErrorKind::Timeout | ErrorKind::RateLimited => true,
        ErrorKind::Http(status) => is_retryable_status(status),
        ErrorKind::Canceled | ErrorKind::Other => false,
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    (500..=599).contains(&status) || status == STATUS_TOO_MANY_REQUESTS
}

/// Default user-facing message for a status when the server sent none.
pub fn status_message(status: u16, retry_after_seconds: Option<u64>) -> String {
    let msg = match status {
        400 => "Invalid request. Please check your input and try again.",
        401 => "Please log in to continue.",
        403 => "You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        409 => "This email is already registered on the waitlist.",
        STATUS_TOO_MANY_REQUESTS => {
            return match retry_after_seconds {
                Some(secs) => format!("Too many requests. Please try again in {} seconds.", secs),
                None => "Too many requests. Please wait before trying again.".to_string(),
            };
        }
        500 => "Server error. Please try again later.",
        502 | 503 => "Service temporarily unavailable. Please try again later.",
        504 => "Request timed out. Please try again.",
        _ => MSG_GENERIC,
    };
    msg.to_string()
}

/// `retry-after` in whole seconds; the HTTP-date form is not honored.
fn parse_retry_after(failure: &HttpFailure) -> Option<u64> {
    if failure.status != STATUS_TOO_MANY_REQUESTS {
        return None;
    }
    failure
        .rate_limit
        .retry_after
        .as_deref()
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Pure classification of a failed call.
pub fn classify(err: &ApiError) -> ErrorInfo {
    let (kind, message, retry_after_seconds) = match err {
        ApiError::Network(_) => (ErrorKind::Network, MSG_NETWORK.to_string(), None),
        ApiError::Timeout(_) => (ErrorKind::Timeout, MSG_TIMEOUT.to_string(), None),
        ApiError::Canceled => (ErrorKind::Canceled, MSG_CANCELED.to_string(), None),
        ApiError::Decode(_) | ApiError::Setup(_) => {
            (ErrorKind::Other, MSG_UNEXPECTED.to_string(), None)
        }
        ApiError::Http(failure) => {
            let retry_after = parse_retry_after(failure);
            let message = failure
                .server_message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| status_message(failure.status, retry_after));
            (classify_http_status(failure.status), message, retry_after)
        }
    };

    ErrorInfo {
        kind,
        message,
        status_code: err.status_code(),
        is_network_error: kind == ErrorKind::Network,
        is_timeout_error: kind == ErrorKind::Timeout,
        is_rate_limit_error: kind == ErrorKind::RateLimited,
        is_retryable: is_retryable_kind(kind),
        retry_after_seconds,
    }
}
