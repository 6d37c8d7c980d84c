//! Configuration Types
//!
//! Client configuration for the leads API.

use std::time::Duration;

use crate::error::{ApiError, ApiResult, ErrorKind};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Base delay for exponential backoff.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Retries allowed on idempotent requests by default.
pub const DEFAULT_RETRIES: u32 = 2;

/// Default maximum response size (1 MiB).
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 1_048_576;

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = "leads-integration/0.1.0";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "LEADS_API_BASE";

/// Environment variable overriding the timeout, in seconds.
pub const TIMEOUT_ENV: &str = "LEADS_API_TIMEOUT_SECS";

/// API client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL every path is joined to.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Base delay for retry backoff.
    pub retry_base_delay: Duration,
    /// Retries for idempotent requests.
    pub default_retries: u32,
    /// Maximum response body size.
    pub max_response_size: usize,
    /// User-Agent header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            default_retries: DEFAULT_RETRIES,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `LEADS_API_BASE` and `LEADS_API_TIMEOUT_SECS`.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url.trim().to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ApiError::new(
                    ErrorKind::Validation,
                    format!("{} must be a whole number of seconds, got {:?}", TIMEOUT_ENV, raw),
                )
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            ApiError::new(
                ErrorKind::Validation,
                format!("Invalid base URL {:?}: {}", self.base_url, e),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::new(
                ErrorKind::Validation,
                format!("Unsupported base URL scheme: {}", url.scheme()),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ApiError::new(
                ErrorKind::Validation,
                "Timeout must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Join a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}
