//! Cross-cutting request/response hooks attached to a transport at construction.

use std::time::{Duration, Instant};

use super::{ApiResponse, Method};
use crate::retry::ApiError;

/// Per-request diagnostics metadata. Created by the transport for each call.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub request_id: u64,
    pub method: Method,
    pub url: String,
    pub started_at: Instant,
}

impl RequestMeta {
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Hooks invoked around every transport call. Implementations must not keep
/// per-call state; everything they need is in [`RequestMeta`].
pub trait Interceptor: Send + Sync {
    fn on_request(&self, _meta: &RequestMeta) {}
    fn on_response(&self, _meta: &RequestMeta, _response: &ApiResponse) {}
    fn on_error(&self, _meta: &RequestMeta, _error: &ApiError) {}
}

/// Logs each call through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInterceptor;

impl Interceptor for TracingInterceptor {
    fn on_request(&self, meta: &RequestMeta) {
        tracing::debug!(request_id = meta.request_id, "{} {}", meta.method, meta.url);
    }

    fn on_response(&self, meta: &RequestMeta, response: &ApiResponse) {
        let rl = &response.rate_limit;
        tracing::debug!(
            request_id = meta.request_id,
            status = response.status,
            elapsed_ms = meta.elapsed().as_millis() as u64,
            ratelimit_limit = rl.limit.as_deref(),
            ratelimit_remaining = rl.remaining.as_deref(),
            ratelimit_reset = rl.reset.as_deref(),
            "{} {}",
            meta.method,
            meta.url
        );
    }

    fn on_error(&self, meta: &RequestMeta, error: &ApiError) {
        match error {
            ApiError::Http(failure) => tracing::warn!(
                request_id = meta.request_id,
                status = failure.status,
                elapsed_ms = meta.elapsed().as_millis() as u64,
                retry_after = failure.rate_limit.retry_after.as_deref(),
                "{} {} failed",
                meta.method,
                meta.url
            ),
            ApiError::Canceled => tracing::debug!(
                request_id = meta.request_id,
                "{} {} canceled",
                meta.method,
                meta.url
            ),
            other => tracing::warn!(
                request_id = meta.request_id,
                elapsed_ms = meta.elapsed().as_millis() as u64,
                error = %other,
                "{} {} failed",
                meta.method,
                meta.url
            ),
        }
    }
}
