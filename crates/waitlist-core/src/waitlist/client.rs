//! Waitlist API operations, each wrapped in the backoff retrier.

use crate::control::CancelToken;
use crate::retry::{run_with_retry, ApiError, RetryPolicy};
use crate::transport::{ApiRequest, Transport};

use super::types::{
    JoinRequest, JoinResponse, WaitlistInfo, ENDPOINT_WAITLIST, ENDPOINT_WAITLIST_JOIN,
};

/// Join / info calls over an injected transport. Email validation is the
/// caller's job (see [`validate_email`](super::validate_email)).
pub struct WaitlistClient<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> WaitlistClient<T> {
    /// Client using the standard retry policy.
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, RetryPolicy::standard())
    }

    pub fn with_policy(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// `POST /api/waitlist/join`.
    pub async fn join(&self, email: &str) -> Result<JoinResponse, ApiError> {
        self.join_with_cancel(email, &CancelToken::new()).await
    }

    /// Like [`join`](Self::join); once `cancel` is set it aborts the transfer or
    /// backoff sleep and returns [`ApiError::Canceled`].
    pub async fn join_with_cancel(
        &self,
        email: &str,
        cancel: &CancelToken,
    ) -> Result<JoinResponse, ApiError> {
        let body = serde_json::to_value(JoinRequest {
            email: email.trim().to_string(),
        })
        .map_err(|e| ApiError::Setup(e.to_string()))?;
        let request = ApiRequest::post_json(ENDPOINT_WAITLIST_JOIN, body);
        self.call(request, cancel).await
    }

    /// `GET /api/waitlist`.
    pub async fn get_info(&self) -> Result<WaitlistInfo, ApiError> {
        self.call(ApiRequest::get(ENDPOINT_WAITLIST), &CancelToken::new())
            .await
    }

    async fn call<R>(&self, request: ApiRequest, cancel: &CancelToken) -> Result<R, ApiError>
    where
        R: serde::de::DeserializeOwned,
    {
        let transport = &self.transport;
        let attempts = run_with_retry(&self.policy, || {
            let request = request.clone();
            let cancel = cancel.clone();
            async move {
                if cancel.is_canceled() {
                    return Err(ApiError::Canceled);
                }
                let response = transport.send(request, cancel).await?;
                response.json::<R>()
            }
        });
        // Also cuts a backoff sleep short.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Canceled),
            res = attempts => res,
        }
    }
}
