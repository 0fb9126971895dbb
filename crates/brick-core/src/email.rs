//! # Email Address
//!
//! [`Email`] is trimmed and lower-cased before validation; only the
//! normalized form is stored. Validation checks, in order: non-empty, at most
//! [`MAX_EMAIL_LENGTH`] bytes, and the RFC 5322-derived grammar in
//! [`EMAIL_PATTERN`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::BrickError;
use crate::primitive::{impl_text_codecs, must, TextPrimitive};

/// Maximum length of a normalized address.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// `local@domain`, with dot-separated domain labels of at most 63 characters
/// that neither start nor end with a hyphen.
pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is a valid regex")
});

/// A normalized, validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Email(String);

impl Email {
    /// Normalize and validate an email address.
    ///
    /// # Errors
    ///
    /// Invalid input when the address is empty, too long, or malformed. The
    /// raw input is recorded under `input_email`.
    pub fn new(raw: &str) -> Result<Self, BrickError> {
        Self::construct(raw)
    }

    /// Like [`Email::new`], aborting the process on invalid input.
    pub fn must_new(raw: &str) -> Self {
        must(Self::new(raw))
    }

    /// The normalized address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before `@`.
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or("", |(local, _)| local)
    }

    /// The part after `@`.
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl TextPrimitive for Email {
    const TYPE_NAME: &'static str = "Email";

    fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    fn validate(normalized: String, raw: &str) -> Result<Self, BrickError> {
        if normalized.is_empty() {
            return Err(BrickError::validation("Email address cannot be empty.")
                .with_context("input_email", raw));
        }
        if normalized.len() > MAX_EMAIL_LENGTH {
            return Err(BrickError::validation(format!(
                "Email address (length {}) exceeds maximum length of {MAX_EMAIL_LENGTH} characters.",
                normalized.len()
            ))
            .with_context("length", normalized.len())
            .with_context("max_length", MAX_EMAIL_LENGTH)
            .with_context("input_email", raw));
        }
        if !EMAIL_PATTERN.is_match(&normalized) {
            return Err(BrickError::validation(format!(
                "Email address '{raw}' has an invalid format."
            ))
            .with_context("input_email", raw));
        }
        Ok(Self(normalized))
    }

    fn canonical(&self) -> &str {
        &self.0
    }
}

impl_text_codecs!(Email);
