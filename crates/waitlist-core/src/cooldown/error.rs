use crate::retry::{ApiError, ErrorInfo};

/// Why a submit did not produce a success. `Display` is always the user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    /// Email failed the client-side check; nothing was sent.
    #[error("{0}")]
    Validation(&'static str),
    /// A rate-limit cooldown is still running; nothing was sent.
    #[error("Please wait {remaining_secs} seconds before trying again.")]
    CoolingDown { remaining_secs: u64 },
    /// The API call failed after the retrier gave up.
    #[error("{}", .info.message)]
    Api {
        info: ErrorInfo,
        #[source]
        source: ApiError,
    },
    /// Reset, superseded or disposed while in flight; state was left untouched.
    #[error("request canceled")]
    Canceled,
}

impl JoinError {
    pub fn error_info(&self) -> Option<&ErrorInfo> {
        match self {
            JoinError::Api { info, .. } => Some(info),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.error_info().is_some_and(|i| i.is_rate_limit_error)
    }
}
