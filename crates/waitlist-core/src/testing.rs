//! In-memory transport for unit tests: scripted responses, call log, optional gate.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::{Notify, Semaphore};

use crate::control::CancelToken;
use crate::retry::{ApiError, HttpFailure};
use crate::transport::{ApiRequest, ApiResponse, RateLimitInfo, Transport};

pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
    gate: Option<Semaphore>,
    started: Notify,
}

impl ScriptedTransport {
    pub(crate) fn new(responses: Vec<Result<ApiResponse, ApiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            gate: None,
            started: Notify::new(),
        }
    }

    /// Every send waits for a [`release`](Self::release) before answering.
    pub(crate) fn gated(responses: Vec<Result<ApiResponse, ApiError>>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(responses)
        }
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// Resolves once a send has started (one wakeup per send).
    pub(crate) async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest, _cancel: CancelToken) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            // Deliberately ignores cancel: models a response that arrives late.
            gate.acquire().await.unwrap().forget();
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(ApiError::Network("no scripted response".into())))
    }
}

pub(crate) fn ok_json(body: serde_json::Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse {
        status: 200,
        rate_limit: RateLimitInfo::default(),
        body: serde_json::to_vec(&body).unwrap(),
    })
}

pub(crate) fn rate_limited(retry_after: Option<&str>) -> Result<ApiResponse, ApiError> {
    Err(ApiError::Http(HttpFailure {
        status: 429,
        server_message: None,
        rate_limit: RateLimitInfo {
            retry_after: retry_after.map(str::to_string),
            ..RateLimitInfo::default()
        },
    }))
}

pub(crate) fn status(code: u16) -> Result<ApiResponse, ApiError> {
    Err(ApiError::http(code))
}
