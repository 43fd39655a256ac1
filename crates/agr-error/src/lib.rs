// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unified error taxonomy with stable error codes for the agent registry.
//!
//! Every registry error carries an [`ErrorCode`] (a machine-readable, stable
//! string tag that maps to exactly one HTTP status), a human-readable
//! message, optional structured details, and an optional cause chain.  The
//! cause never crosses the service boundary: [`RegistryError::public_message`]
//! returns a generic text for internal errors so store messages, file paths,
//! and hostnames stay in the logs.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that is
/// guaranteed not to change across patch releases, and maps to exactly one
/// HTTP status via [`ErrorCode::http_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed input: bad slug, illegal enum, blocked URL, size cap, etc.
    Validation,
    /// No credential, or the credential did not resolve.
    Unauthorized,
    /// Authenticated but the role does not permit the operation.
    Forbidden,
    /// Resource absent.
    NotFound,
    /// Unique-key collision or stale optimistic-concurrency token.
    Conflict,
    /// A required precondition header was stale.
    PreconditionFailed,
    /// Request body exceeded the configured cap.
    PayloadTooLarge,
    /// Request content type is not accepted by the endpoint.
    UnsupportedMediaType,
    /// Caller exceeded its rate-limit budget.
    RateLimited,
    /// Catch-all for unexpected internal failures.
    Internal,
}

impl ErrorCode {
    /// Stable `&'static str` representation of the code (e.g. `"VALIDATION"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::PreconditionFailed => "PRECONDITION_FAILED",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            Self::RateLimited => "RATE_LIMITED",
            Self::Internal => "INTERNAL",
        }
    }

    /// HTTP status this code maps to on the REST surface.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::PreconditionFailed => 412,
            Self::PayloadTooLarge => 413,
            Self::UnsupportedMediaType => 415,
            Self::RateLimited => 429,
            Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

/// Unified registry error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, optional
/// structured details for the response body, and an optional source error
/// for cause-chaining in logs.
///
/// # Builder usage
///
/// ```
/// use agr_error::{ErrorCode, RegistryError};
///
/// let err = RegistryError::new(ErrorCode::Validation, "slug must be lowercase")
///     .with_details(serde_json::json!({"field": "id"}));
/// assert_eq!(err.code.http_status(), 400);
/// ```
pub struct RegistryError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional structured details surfaced in the response body.
    pub details: Option<serde_json::Value>,
    /// Optional underlying cause. Logged, never serialised.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RegistryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Shorthand for a [`ErrorCode::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Shorthand for a [`ErrorCode::NotFound`] error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Shorthand for a [`ErrorCode::Conflict`] error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Shorthand for a [`ErrorCode::Internal`] error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Attach structured details to surface in the response body.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The message that may cross the service boundary.
    ///
    /// Internal errors answer with a fixed generic text; the original message
    /// and cause are only ever written to the log.
    #[must_use]
    pub fn public_message(&self) -> &str {
        match self.code {
            ErrorCode::Internal => "internal error",
            _ => &self.message,
        }
    }

    /// Serialisable body fragment for the response envelope, with internal
    /// provenance stripped.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code,
            message: self.public_message().to_string(),
            details: match self.code {
                ErrorCode::Internal => None,
                _ => self.details.clone(),
            },
        }
    }
}

impl fmt::Debug for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("RegistryError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref details) = self.details {
            d.field("details", details);
        }
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        d.finish()
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// ErrorBody
// ---------------------------------------------------------------------------

/// Wire shape of the `error` object inside the response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// Error code.
    pub code: ErrorCode,
    /// Public, redacted message.
    pub message: String,
    /// Structured details, absent for internal errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
