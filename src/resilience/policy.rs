//! Request Policy
//!
//! Per-request knobs for the executor: retry budget, idempotency,
//! authentication, cancellation, and the validator applied to success bodies.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, ApiResult};
use crate::types::{CandidateDecoders, DEFAULT_RETRIES};

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// HTTP 204.
    NoContent,
    /// Body parsed as JSON.
    Json(Value),
    /// Anything else, including an empty body on a non-204 status.
    Text(String),
}

impl ResponseBody {
    /// Classify a raw success body.
    pub fn from_response(status: u16, body: &str) -> Self {
        if status == 204 {
            return Self::NoContent;
        }
        match serde_json::from_str(body) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(body.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The JSON value, or a VALIDATION error.
    pub fn into_json(self) -> ApiResult<Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::NoContent => Err(ApiError::validation("Expected a response body, got 204")),
            Self::Text(text) if text.trim().is_empty() => {
                Err(ApiError::validation("Expected a JSON body, got an empty response"))
            }
            Self::Text(_) => Err(ApiError::validation("Expected a JSON response body")),
        }
    }
}

type Validator<T> = Arc<dyn Fn(ResponseBody) -> ApiResult<T> + Send + Sync>;

/// Execution policy for one logical request.
pub struct RequestPolicy<T> {
    /// Retries allowed after the first attempt.
    pub retries: u32,
    /// Whether the request may be retried on transient failures.
    pub idempotent: bool,
    /// Whether the request carries the session's bearer token.
    pub authenticated: bool,
    /// Caller cancellation.
    pub cancel: Option<CancellationToken>,
    validate: Validator<T>,
}

impl<T> Clone for RequestPolicy<T> {
    fn clone(&self) -> Self {
        Self {
            retries: self.retries,
            idempotent: self.idempotent,
            authenticated: self.authenticated,
            cancel: self.cancel.clone(),
            validate: Arc::clone(&self.validate),
        }
    }
}

impl<T> fmt::Debug for RequestPolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPolicy")
            .field("retries", &self.retries)
            .field("idempotent", &self.idempotent)
            .field("authenticated", &self.authenticated)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

impl RequestPolicy<ResponseBody> {
    /// Returns the raw body unvalidated.
    pub fn raw() -> Self {
        Self::validated(Ok)
    }
}

impl Default for RequestPolicy<ResponseBody> {
    fn default() -> Self {
        Self::raw()
    }
}

impl RequestPolicy<()> {
    /// Discards the body; for endpoints answering 204.
    pub fn no_content() -> Self {
        Self::validated(|_| Ok(()))
    }
}

impl<T: DeserializeOwned + 'static> RequestPolicy<T> {
    /// Deserializes the JSON body into `T`.
    pub fn json() -> Self {
        Self::validated(|body: ResponseBody| {
            let value = body.into_json()?;
            serde_json::from_value(value)
                .map_err(|e| ApiError::validation(format!("Invalid response body: {}", e)))
        })
    }
}

impl<T: 'static> RequestPolicy<T> {
    /// Applies `validate` to every success body.
    pub fn validated<F>(validate: F) -> Self
    where
        F: Fn(ResponseBody) -> ApiResult<T> + Send + Sync + 'static,
    {
        Self {
            retries: DEFAULT_RETRIES,
            idempotent: false,
            authenticated: true,
            cancel: None,
            validate: Arc::new(validate),
        }
    }

    /// Decodes the JSON body with an ordered list of candidates.
    pub fn decoders(decoders: CandidateDecoders<T>) -> Self {
        Self::validated(move |body: ResponseBody| decoders.decode(&body.into_json()?))
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }

    /// Sends without a bearer token and never enters the refresh path.
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Applies the validator.
    pub fn validate(&self, body: ResponseBody) -> ApiResult<T> {
        (self.validate)(body)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancellationToken::is_cancelled)
    }
}
