//! Transport-level error type for retry classification.

use std::time::Duration;

use crate::transport::RateLimitInfo;

/// Error returned by a single API call (transport failure or HTTP error status).
/// Kept typed so the classifier can decide retries before anything is shown to a user.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request was sent (or attempted) but no response arrived: DNS, connect, reset.
    #[error("network error: {0}")]
    Network(String),
    /// Client-side timeout elapsed before the response completed.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Server answered with a non-2xx status.
    #[error("HTTP {}", .0.status)]
    Http(HttpFailure),
    /// The caller canceled the request; its outcome must be ignored.
    #[error("request canceled")]
    Canceled,
    /// 2xx response whose body did not match the expected payload.
    #[error("invalid response body: {0}")]
    Decode(String),
    /// Request could not be built (bad URL, header, worker failure).
    #[error("request setup failed: {0}")]
    Setup(String),
}

/// Details of an error-status response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpFailure {
    pub status: u16,
    /// `error` field of a JSON error body, if the server sent one.
    pub server_message: Option<String>,
    pub rate_limit: RateLimitInfo,
}

impl ApiError {
    /// Shorthand for an HTTP failure without body or headers.
    pub fn http(status: u16) -> Self {
        ApiError::Http(HttpFailure {
            status,
            ..HttpFailure::default()
        })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Http(failure) => Some(failure.status),
            _ => None,
        }
    }
}
