//! Parse response header lines and JSON error bodies.

pub const HEADER_RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Rate-limit headers as sent by the server (raw strings; absent when not sent).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: Option<String>,
    pub remaining: Option<String>,
    pub reset: Option<String>,
    pub retry_after: Option<String>,
}

impl RateLimitInfo {
    pub fn is_empty(&self) -> bool {
        self.limit.is_none()
            && self.remaining.is_none()
            && self.reset.is_none()
            && self.retry_after.is_none()
    }
}

/// Split raw header lines into lowercase `(name, value)` pairs.
///
/// Status lines and blanks are skipped. With redirects curl reports several
/// header blocks; a new status line discards the headers collected so far.
pub(crate) fn parse_header_lines(lines: &[String]) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }
    headers
}

/// Pull the rate-limit headers out of parsed headers.
pub(crate) fn rate_limit_info(headers: &[(String, String)]) -> RateLimitInfo {
    let find = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    RateLimitInfo {
        limit: find(HEADER_RATE_LIMIT_LIMIT),
        remaining: find(HEADER_RATE_LIMIT_REMAINING),
        reset: find(HEADER_RATE_LIMIT_RESET),
        retry_after: find(HEADER_RETRY_AFTER),
    }
}

/// `error` string field of a JSON error body, if any.
pub(crate) fn server_error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("error")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
