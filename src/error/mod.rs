//! Error Types
//!
//! Stable error contract for every operation that goes through the request layer.

pub mod normalize;

pub use normalize::{
    extract_message, normalize_response, normalize_transport, parse_retry_after, status_kind,
};

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Canonical error kinds callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection failure, no response received.
    Network,
    /// Client-side timeout elapsed.
    Timeout,
    /// 401, or a session that could not be refreshed.
    Unauthorized,
    /// 403.
    Forbidden,
    /// 404.
    NotFound,
    /// 409.
    Conflict,
    /// 429.
    RateLimited,
    /// 400/422, or a success body that failed validation.
    Validation,
    /// 5xx.
    Server,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Wire-style code for telemetry and the UI layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "NETWORK",
            Self::Timeout => "TIMEOUT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Validation => "VALIDATION",
            Self::Server => "SERVER",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Kinds the executor may retry on idempotent operations.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::Server | Self::RateLimited
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed `Retry-After` header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAfter {
    /// Delay in whole seconds.
    Seconds(u64),
    /// Absolute HTTP date.
    At(DateTime<Utc>),
}

impl RetryAfter {
    /// Delay relative to `now`; dates in the past yield zero.
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Self::Seconds(secs) => Duration::from_secs(*secs),
            Self::At(at) => (*at - now).to_std().unwrap_or(Duration::ZERO),
        }
    }
}

/// Normalized API error.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ApiError {
    code: ErrorKind,
    message: String,
    status: Option<u16>,
    request_id: Option<String>,
    details: Option<serde_json::Value>,
    retry_after: Option<RetryAfter>,
    cancelled: bool,
}

impl ApiError {
    /// Creates a new error.
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            request_id: None,
            details: None,
            retry_after: None,
            cancelled: false,
        }
    }

    /// Sets the HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the server request ID.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attaches structured details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attaches a parsed `Retry-After` value.
    pub fn with_retry_after(mut self, retry_after: RetryAfter) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Caller-initiated cancellation. Terminal, never retried.
    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::new(ErrorKind::Unknown, "Request cancelled")
        }
    }

    /// Authenticated request attempted with no session.
    pub fn not_authenticated() -> Self {
        Self::new(ErrorKind::Unauthorized, "Not authenticated")
    }

    /// Success body rejected by a validator.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn code(&self) -> ErrorKind {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }

    pub fn retry_after(&self) -> Option<RetryAfter> {
        self.retry_after
    }

    /// Whether the caller cancelled the request.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Whether the error is a candidate for automatic retry.
    pub fn is_transient(&self) -> bool {
        !self.cancelled && self.code.is_transient()
    }

    /// Whether the user has to sign in again.
    pub fn needs_reauth(&self) -> bool {
        self.code == ErrorKind::Unauthorized
    }

    /// Message suitable for display.
    pub fn user_message(&self) -> String {
        get_user_message(self)
    }
}

impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
            && self.message == other.message
            && self.status == other.status
            && self.request_id == other.request_id
            && self.cancelled == other.cancelled
    }
}

/// Get user-friendly error message.
pub fn get_user_message(error: &ApiError) -> String {
    if error.is_cancelled() {
        return "The request was cancelled.".to_string();
    }
    match error.code() {
        ErrorKind::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
        ErrorKind::Forbidden => "You do not have permission to do that.".to_string(),
        ErrorKind::NotFound => "The requested item could not be found.".to_string(),
        ErrorKind::Conflict => "This item was changed or already exists.".to_string(),
        ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.".to_string(),
        ErrorKind::Validation => error.message().to_string(),
        ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Server => {
            "The service is temporarily unavailable. Please try again later.".to_string()
        }
        ErrorKind::Unknown => "Something went wrong. Please try again.".to_string(),
    }
}
