//! HTTP boundary: request/response types, the `Transport` seam, and the
//! curl-backed implementation with its interceptors.
//!
//! One configured transport is built at startup and injected into the
//! waitlist client; nothing registers hooks globally.

mod http;
mod interceptor;
mod parse;

use std::fmt;
use std::future::Future;

use crate::control::CancelToken;
use crate::retry::{ApiError, HttpFailure};

pub use http::{HttpTransport, HttpTransportBuilder};
pub use interceptor::{Interceptor, RequestMeta, TracingInterceptor};
pub use parse::{
    RateLimitInfo, HEADER_RATE_LIMIT_LIMIT, HEADER_RATE_LIMIT_REMAINING, HEADER_RATE_LIMIT_RESET,
    HEADER_RETRY_AFTER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A request relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path such as `/api/waitlist/join`.
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post_json(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub rate_limit: RateLimitInfo,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Pass 2xx through; turn anything else into [`ApiError::Http`].
    pub fn error_for_status(self) -> Result<ApiResponse, ApiError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(ApiError::Http(HttpFailure {
            status: self.status,
            server_message: parse::server_error_message(&self.body),
            rate_limit: self.rate_limit,
        }))
    }

    /// Deserialize the JSON body.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Sends one request. Resolves to `Ok` only for 2xx responses; error statuses
/// come back as [`ApiError::Http`]. Must give up with [`ApiError::Canceled`]
/// promptly once `cancel` is set.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: ApiRequest,
        cancel: CancelToken,
    ) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send;
}
