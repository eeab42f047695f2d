//! Wire payloads of the waitlist API.

use serde::{Deserialize, Serialize};

pub const ENDPOINT_WAITLIST: &str = "/api/waitlist";
pub const ENDPOINT_WAITLIST_JOIN: &str = "/api/waitlist/join";

/// Body of `POST /api/waitlist/join`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub email: String,
}

/// Success body of `POST /api/waitlist/join`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponse {
    pub message: String,
}

/// Body of `GET /api/waitlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistInfo {
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
