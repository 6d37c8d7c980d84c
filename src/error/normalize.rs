//! Error Normalization
//!
//! Pure mapping from raw transport outcomes to [`ApiError`]. No side effects;
//! the same input always produces the same error.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use super::{ApiError, ErrorKind, RetryAfter};
use crate::core::{HttpResponse, TransportError};

/// Header echoed into [`ApiError::request_id`].
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header consulted for rate-limit backoff.
pub const RETRY_AFTER_HEADER: &str = "retry-after";

const FALLBACK_MESSAGE: &str = "Request failed";

/// Obsolete HTTP-date forms still accepted by recipients: RFC 850 and asctime.
const OBSOLETE_DATE_FORMATS: [&str; 2] = ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"];

/// Map an HTTP status to its error kind.
pub fn status_kind(status: u16) -> ErrorKind {
    match status {
        400 | 422 => ErrorKind::Validation,
        401 => ErrorKind::Unauthorized,
        403 => ErrorKind::Forbidden,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::Conflict,
        429 => ErrorKind::RateLimited,
        s if s >= 500 => ErrorKind::Server,
        _ => ErrorKind::Unknown,
    }
}

/// Normalize a failure that produced no response.
pub fn normalize_transport(error: &TransportError) -> ApiError {
    match error {
        TransportError::Cancelled => ApiError::cancelled(),
        TransportError::Timeout { .. } => ApiError::new(ErrorKind::Timeout, error.to_string()),
        TransportError::Connection { message } if message.is_empty() => {
            ApiError::new(ErrorKind::Network, "Network error")
        }
        TransportError::Connection { .. } => ApiError::new(ErrorKind::Network, error.to_string()),
        TransportError::ResponseTooLarge { .. } => {
            ApiError::new(ErrorKind::Unknown, error.to_string())
        }
    }
}

/// Normalize a non-2xx response.
pub fn normalize_response(response: &HttpResponse) -> ApiError {
    let kind = status_kind(response.status);
    let body: Option<Value> = serde_json::from_str(&response.body).ok();

    let message = body
        .as_ref()
        .and_then(extract_message)
        .unwrap_or_else(|| transport_message(response));

    let mut error = ApiError::new(kind, message).with_status(response.status);

    if let Some(request_id) = response.header(REQUEST_ID_HEADER) {
        error = error.with_request_id(request_id);
    }

    if kind == ErrorKind::Validation {
        let details = body.unwrap_or_else(|| Value::String(response.body.clone()));
        error = error.with_details(details);
    }

    if kind == ErrorKind::RateLimited {
        if let Some(retry_after) = response
            .header(RETRY_AFTER_HEADER)
            .and_then(parse_retry_after)
        {
            error = error.with_retry_after(retry_after);
        }
    }

    error
}

/// Pull a human-readable message out of a structured error body.
///
/// Accepts `{"detail": "..."}`, FastAPI validation lists
/// (`{"detail": [{"msg": "..."}]}`), and `{"message": "..."}`.
pub fn extract_message(body: &Value) -> Option<String> {
    let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());

    match body.get("detail") {
        Some(Value::String(detail)) => {
            if let Some(message) = non_empty(detail) {
                return Some(message);
            }
        }
        Some(Value::Array(items)) => {
            if let Some(message) = items
                .iter()
                .find_map(|item| item.get("msg").and_then(Value::as_str))
                .and_then(non_empty)
            {
                return Some(message);
            }
        }
        _ => {}
    }

    body.get("message")
        .and_then(Value::as_str)
        .and_then(non_empty)
}

/// Parse a `Retry-After` value: integer seconds or an HTTP date.
pub fn parse_retry_after(value: &str) -> Option<RetryAfter> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(RetryAfter::Seconds(secs));
    }
    if let Ok(at) = DateTime::parse_from_rfc2822(value) {
        return Some(RetryAfter::At(at.with_timezone(&Utc)));
    }
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    OBSOLETE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&collapsed, format).ok())
        .map(|naive| RetryAfter::At(Utc.from_utc_datetime(&naive)))
}

fn transport_message(response: &HttpResponse) -> String {
    if response.status == 0 {
        return FALLBACK_MESSAGE.to_string();
    }
    format!("Request failed with status code {}", response.status)
}
