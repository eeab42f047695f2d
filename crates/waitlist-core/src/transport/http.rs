//! curl-backed transport. Each request runs a libcurl `Easy` handle on the
//! blocking pool; the cancel token is polled from the progress callback.

use std::str;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use url::Url;

use super::interceptor::{Interceptor, RequestMeta, TracingInterceptor};
use super::parse::{parse_header_lines, rate_limit_info};
use super::{ApiRequest, ApiResponse, Method, Transport};
use crate::config::WaitlistConfig;
use crate::control::CancelToken;
use crate::retry::ApiError;

/// Shared transport configuration: base URL, timeouts, default headers and interceptors.
/// Build one at startup and hand it to the client.
pub struct HttpTransport {
    base_url: Url,
    timeout: Duration,
    connect_timeout: Duration,
    default_headers: Vec<(String, String)>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    next_request_id: AtomicU64,
}

pub struct HttpTransportBuilder {
    base_url: String,
    timeout: Duration,
    connect_timeout: Duration,
    default_headers: Vec<(String, String)>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl HttpTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn build(self) -> Result<HttpTransport> {
        let base_url = Url::parse(self.base_url.trim())
            .with_context(|| format!("invalid API base URL {:?}", self.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL {} cannot be used as a base", base_url);
        }
        Ok(HttpTransport {
            base_url,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            default_headers: self.default_headers,
            interceptors: self.interceptors,
            next_request_id: AtomicU64::new(1),
        })
    }
}

impl HttpTransport {
    /// JSON defaults, 30s timeout, no interceptors.
    pub fn builder(base_url: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            default_headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
            interceptors: Vec::new(),
        }
    }

    /// Transport for the configured API with request logging attached.
    pub fn from_config(cfg: &WaitlistConfig) -> Result<Self> {
        Self::builder(cfg.require_base_url()?)
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .interceptor(TracingInterceptor)
            .build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `path` appended (base path segments are kept).
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| ApiError::Setup(format!("bad endpoint {:?}: {}", path, e)))
    }

    fn prepare(&self, request: &ApiRequest, cancel: CancelToken) -> Result<CurlRequest, ApiError> {
        let url = self.endpoint(&request.path)?;
        let body = match &request.body {
            Some(value) => serde_json::to_vec(value)
                .map_err(|e| ApiError::Setup(format!("encoding body: {}", e)))?,
            None => Vec::new(),
        };
        Ok(CurlRequest {
            url: url.to_string(),
            method: request.method,
            body,
            headers: self.default_headers.clone(),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            cancel,
        })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest, cancel: CancelToken) -> Result<ApiResponse, ApiError> {
        let job = self.prepare(&request, cancel.clone())?;
        let meta = RequestMeta {
            request_id: self.next_request_id.fetch_add(1, Ordering::Relaxed),
            method: request.method,
            url: job.url.clone(),
            started_at: Instant::now(),
        };
        for hook in &self.interceptors {
            hook.on_request(&meta);
        }

        let result = if cancel.is_canceled() {
            Err(ApiError::Canceled)
        } else {
            match tokio::task::spawn_blocking(move || job.perform()).await {
                Ok(res) => res,
                Err(e) => Err(ApiError::Setup(format!("transport worker failed: {}", e))),
            }
        };
        let result = result.and_then(ApiResponse::error_for_status);

        match &result {
            Ok(response) => {
                for hook in &self.interceptors {
                    hook.on_response(&meta, response);
                }
            }
            Err(e) => {
                for hook in &self.interceptors {
                    hook.on_error(&meta, e);
                }
            }
        }
        result
    }
}

/// Everything the blocking worker needs; owned so it can move to another thread.
struct CurlRequest {
    url: String,
    method: Method,
    body: Vec<u8>,
    headers: Vec<(String, String)>,
    timeout: Duration,
    connect_timeout: Duration,
    cancel: CancelToken,
}

fn setup_error(e: curl::Error) -> ApiError {
    ApiError::Setup(e.to_string())
}

/// Map a curl transfer error to the API taxonomy.
fn classify_curl_error(e: &curl::Error, timeout: Duration) -> ApiError {
    if e.is_aborted_by_callback() {
        return ApiError::Canceled;
    }
    if e.is_operation_timedout() {
        return ApiError::Timeout(timeout);
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return ApiError::Setup(e.to_string());
    }
    // Connect, resolve, send/recv and empty-reply failures: no response arrived.
    ApiError::Network(e.to_string())
}

impl CurlRequest {
    /// Runs in the current thread; called from `spawn_blocking`.
    fn perform(self) -> Result<ApiResponse, ApiError> {
        let mut header_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&self.url).map_err(setup_error)?;
        match self.method {
            Method::Get => easy.get(true).map_err(setup_error)?,
            Method::Post => {
                easy.post(true).map_err(setup_error)?;
                easy.post_fields_copy(&self.body).map_err(setup_error)?;
                // curl downgrades POST to GET on 301/302/303 unless told otherwise.
                let mut keep_post = curl::easy::PostRedirections::new();
                keep_post.redirect_all(true);
                easy.post_redirections(&keep_post).map_err(setup_error)?;
            }
        }
        easy.follow_location(true).map_err(setup_error)?;
        easy.timeout(self.timeout).map_err(setup_error)?;
        easy.connect_timeout(self.connect_timeout).map_err(setup_error)?;
        easy.progress(true).map_err(setup_error)?;

        let mut list = curl::easy::List::new();
        for (k, v) in &self.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))
                .map_err(setup_error)?;
        }
        easy.http_headers(list).map_err(setup_error)?;

        {
            let cancel = self.cancel.clone();
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        header_lines.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(setup_error)?;
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(setup_error)?;
            // Returning false aborts the transfer with CURLE_ABORTED_BY_CALLBACK.
            transfer
                .progress_function(move |_, _, _, _| !cancel.is_canceled())
                .map_err(setup_error)?;
            transfer
                .perform()
                .map_err(|e| classify_curl_error(&e, self.timeout))?;
        }

        let code = easy.response_code().map_err(setup_error)?;
        let status = u16::try_from(code)
            .map_err(|_| ApiError::Setup(format!("invalid status code {}", code)))?;
        let headers = parse_header_lines(&header_lines);
        Ok(ApiResponse {
            status,
            rate_limit: rate_limit_info(&headers),
            body,
        })
    }
}
