//! # Error Model
//!
//! A single structured error type, [`BrickError`], through which every
//! primitive reports construction and decoding failures. Built with
//! `thiserror`; the lower-level cause is exposed through
//! [`std::error::Error::source`].
//!
//! ## Design
//!
//! - [`ErrorKind`] is a closed set. Each kind maps to exactly one HTTP status
//!   code via [`ErrorKind::status_code`].
//! - Diagnostic context is a sorted key/value map of JSON values, so
//!   projections are deterministic.
//! - Context can be appended as an error crosses layer boundaries without
//!   touching the cause chain.
//! - Aggregate failures carry child errors in `details`, projected
//!   recursively by [`BrickError::to_response`].

use std::collections::BTreeMap;

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Boxed lower-level cause carried by a [`BrickError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Diagnostic context attached to an error.
pub type ErrorContext = BTreeMap<String, Value>;

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The operation conflicts with the current state of a resource.
    #[serde(rename = "conflict")]
    Conflict,
    /// Caller-supplied data is malformed or fails validation.
    #[serde(rename = "invalid_input")]
    InvalidInput,
    /// The requested resource does not exist.
    #[serde(rename = "not_found")]
    NotFound,
    /// A failure unrelated to caller input (clock, entropy, encoder).
    #[serde(rename = "internal_error")]
    Internal,
    /// Authentication is missing or invalid.
    #[serde(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated, but not permitted.
    #[serde(rename = "forbidden")]
    Forbidden,
    /// A cross-field business rule was violated.
    #[serde(rename = "domain_violation")]
    DomainViolation,
}

impl ErrorKind {
    /// Stable tag used in projections and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conflict => "conflict",
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::Internal => "internal_error",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::DomainViolation => "domain_violation",
        }
    }

    /// Transport status code for this kind.
    ///
    /// Domain violations have no dedicated status and fall back to 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Conflict => StatusCode::CONFLICT,
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal | Self::DomainViolation => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error shared by every primitive in the crate.
///
/// Displays as `message` or, when a cause is attached, `message: cause`.
///
/// # Examples
///
/// ```
/// use brick_core::{BrickError, ErrorKind};
///
/// let err = BrickError::validation("Email address cannot be empty.")
///     .with_context("input_email", "   ");
/// assert_eq!(err.kind(), ErrorKind::InvalidInput);
/// assert_eq!(err.status_code().as_u16(), 400);
/// ```
#[derive(Error, Debug)]
#[error("{}", render(.message, .source))]
pub struct BrickError {
    #[source]
    source: Option<BoxError>,
    message: String,
    kind: ErrorKind,
    context: ErrorContext,
    details: Vec<BrickError>,
}

fn render(message: &str, source: &Option<BoxError>) -> String {
    match source {
        Some(cause) => format!("{message}: {cause}"),
        None => message.to_string(),
    }
}

impl BrickError {
    /// Create an error of the given kind with an empty context.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            source: None,
            message: message.into(),
            kind,
            context: ErrorContext::new(),
            details: Vec::new(),
        }
    }

    /// Invalid caller input, with a message describing what was wrong.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Invalid caller input, with the generic malformed-request message.
    pub fn bad_request() -> Self {
        Self::validation("The request is malformed or contains invalid parameters.")
    }

    /// Failure unrelated to caller input.
    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal, "An unexpected internal error occurred.")
    }

    /// Missing or invalid authentication.
    pub fn unauthorized() -> Self {
        Self::new(
            ErrorKind::Unauthorized,
            "You are not authorized to perform this action.",
        )
    }

    /// Authenticated caller lacking permission.
    pub fn forbidden() -> Self {
        Self::new(
            ErrorKind::Forbidden,
            "You do not have permission to perform this action.",
        )
    }

    /// Resource not found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Conflict with current resource state.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Cross-field business rule violation.
    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DomainViolation, message)
    }

    /// Attach the lower-level cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Append one context entry, replacing any previous value under `key`.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Append a child error (aggregate validation).
    pub fn with_detail(mut self, detail: BrickError) -> Self {
        self.details.push(detail);
        self
    }

    /// Append several child errors.
    pub fn with_details(mut self, details: impl IntoIterator<Item = BrickError>) -> Self {
        self.details.extend(details);
        self
    }

    /// Failure category.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message, without the cause.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Full diagnostic context.
    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// One context entry.
    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Child errors.
    pub fn details(&self) -> &[BrickError] {
        &self.details
    }

    /// Transport status code derived from the kind.
    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Project into the boundary artifact consumed by transport layers.
    ///
    /// Internal errors are logged here, once, at the point they leave the
    /// domain.
    pub fn to_response(&self) -> ErrorResponse {
        if self.kind == ErrorKind::Internal {
            tracing::error!(error = %self, context = ?self.context, "internal error projected to response");
        }
        ErrorResponse {
            status_code: self.status_code(),
            message: self.message.clone(),
            code: self.kind.as_str().to_string(),
            context: self.context.clone(),
            details: self.details.iter().map(BrickError::to_response).collect(),
        }
    }
}

/// Response projection of a [`BrickError`].
///
/// `status_code` is for the transport layer and is not serialized; empty
/// `code`, `context` and `details` are omitted from the JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    /// Transport status code.
    #[serde(skip)]
    pub status_code: StatusCode,
    /// Human-readable message.
    pub message: String,
    /// Kind tag, e.g. `invalid_input`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub code: String,
    /// Diagnostic context.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: ErrorContext,
    /// Recursively projected child errors.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::error::Error as _;

    #[test]
    fn status_codes_per_kind() {
        assert_eq!(ErrorKind::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::InvalidInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorKind::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorKind::DomainViolation.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn kind_tags_match_serde() {
        for kind in [
            ErrorKind::Conflict,
            ErrorKind::InvalidInput,
            ErrorKind::NotFound,
            ErrorKind::Internal,
            ErrorKind::Unauthorized,
            ErrorKind::Forbidden,
            ErrorKind::DomainViolation,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
    }

    #[test]
    fn display_without_cause_is_message() {
        let err = BrickError::validation("bad phone");
        assert_eq!(err.to_string(), "bad phone");
        assert!(err.source().is_none());
    }

    #[test]
    fn display_with_cause_appends_it() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = BrickError::internal().with_source(cause);
        assert_eq!(
            err.to_string(),
            "An unexpected internal error occurred.: disk gone"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn context_enrichment_keeps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "root");
        let err = BrickError::validation("outer")
            .with_source(cause)
            .with_context("input", "x")
            .with_context("layer", "storage");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context_value("layer"), Some(&json!("storage")));
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("root"));
    }

    #[test]
    fn with_context_replaces_same_key() {
        let err = BrickError::validation("x")
            .with_context("k", 1)
            .with_context("k", 2);
        assert_eq!(err.context_value("k"), Some(&json!(2)));
    }

    #[test]
    fn default_messages() {
        assert_eq!(BrickError::bad_request().kind(), ErrorKind::InvalidInput);
        assert!(BrickError::bad_request().message().contains("malformed"));
        assert_eq!(BrickError::unauthorized().kind(), ErrorKind::Unauthorized);
        assert_eq!(BrickError::forbidden().kind(), ErrorKind::Forbidden);
        assert_eq!(BrickError::internal().kind(), ErrorKind::Internal);
        assert_eq!(BrickError::domain("rule").kind(), ErrorKind::DomainViolation);
        assert_eq!(BrickError::conflict("dup").kind(), ErrorKind::Conflict);
        assert_eq!(BrickError::not_found("gone").kind(), ErrorKind::NotFound);
    }

    #[test]
    fn projection_of_invalid_input() {
        let resp = BrickError::validation("Day must be between 1 and 31.")
            .with_context("input_value", 32)
            .to_response();
        assert_eq!(resp.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(resp.code, "invalid_input");
        assert_eq!(resp.context.get("input_value"), Some(&json!(32)));
        assert!(resp.details.is_empty());
    }

    #[test]
    fn projection_recurses_into_details() {
        let email = BrickError::validation("bad email").with_context("input_email", "nope");
        let phone = BrickError::validation("bad phone").with_context("input_phone", "123");
        let aggregate = BrickError::domain("customer is invalid").with_details([email, phone]);

        let resp = aggregate.to_response();
        assert_eq!(resp.code, "domain_violation");
        assert_eq!(resp.details.len(), 2);
        assert_eq!(resp.details[0].code, "invalid_input");
        assert_eq!(resp.details[0].status_code, StatusCode::BAD_REQUEST);
        assert_eq!(resp.details[0].context.get("input_email"), Some(&json!("nope")));
        assert_eq!(resp.details[1].message, "bad phone");
        assert_eq!(resp.details[1].context.get("input_phone"), Some(&json!("123")));
    }

    #[test]
    fn response_json_omits_empty_fields() {
        let body = serde_json::to_value(BrickError::not_found("missing").to_response()).unwrap();
        assert_eq!(body, json!({ "message": "missing", "code": "not_found" }));
    }

    #[test]
    fn response_json_includes_nested_details() {
        let resp = BrickError::validation("outer")
            .with_detail(BrickError::validation("inner").with_context("field", "email"))
            .to_response();
        let body = serde_json::to_value(&resp).unwrap();
        assert_eq!(body["details"][0]["context"]["field"], json!("email"));
        assert!(body.get("status_code").is_none());
    }

    #[test]
    fn errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BrickError>();
    }
}
