//! Waitlist domain: API client, payloads and the email validator.

mod client;
mod types;
mod validate;

pub use client::WaitlistClient;
pub use types::{JoinRequest, JoinResponse, WaitlistInfo, ENDPOINT_WAITLIST, ENDPOINT_WAITLIST_JOIN};
pub use validate::{
    validate_email, validate_email_opt, EmailValidation, MSG_EMAIL_INVALID, MSG_EMAIL_REQUIRED,
};
