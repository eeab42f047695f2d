//! Client-side email check, run before any request is made.

use once_cell::sync::OnceCell;
use regex_lite::Regex;

pub const MSG_EMAIL_REQUIRED: &str = "Email is required";
pub const MSG_EMAIL_INVALID: &str = "Please enter a valid email address";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailValidation {
    pub is_valid: bool,
    pub error: Option<&'static str>,
}

impl EmailValidation {
    const OK: Self = Self {
        is_valid: true,
        error: None,
    };

    fn invalid(error: &'static str) -> Self {
        Self {
            is_valid: false,
            error: Some(error),
        }
    }
}

fn email_re() -> &'static Regex {
    static EMAIL_RE: OnceCell<Regex> = OnceCell::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// `local@domain.tld`-shaped, after trimming surrounding whitespace.
pub fn validate_email(email: &str) -> EmailValidation {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return EmailValidation::invalid(MSG_EMAIL_REQUIRED);
    }
    if !email_re().is_match(trimmed) {
        return EmailValidation::invalid(MSG_EMAIL_INVALID);
    }
    EmailValidation::OK
}

/// Same as [`validate_email`], treating a missing value as empty.
pub fn validate_email_opt(email: Option<&str>) -> EmailValidation {
    validate_email(email.unwrap_or_default())
}
