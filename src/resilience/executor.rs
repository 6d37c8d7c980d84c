//! Request Executor
//!
//! Runs one logical request: attempts, backoff, refresh-and-replay on 401,
//! cancellation, and validation of the success body.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::policy::{RequestPolicy, ResponseBody};
use super::retry::{should_retry, RetryConfig};
use crate::core::{HttpResponse, TransportError};
use crate::error::{normalize_response, normalize_transport, ApiError, ApiResult, ErrorKind};
use crate::telemetry::ClientMetrics;
use crate::token::{AuthStore, RefreshCoordinator};

/// Context handed to the operation for each transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Position in the retry ladder, starting at 1. A replay after refresh
    /// reuses the number of the attempt it replays.
    pub number: u32,
    /// Bearer token to send, read from the store right before the call.
    /// `None` for unauthenticated requests.
    pub access_token: Option<String>,
    /// Whether this call replays a request that got a 401.
    pub replayed: bool,
}

/// Executes requests against the shared session.
pub struct RequestExecutor {
    store: Arc<AuthStore>,
    coordinator: Arc<RefreshCoordinator>,
    retry: RetryConfig,
    metrics: Arc<ClientMetrics>,
}

impl RequestExecutor {
    pub fn new(
        store: Arc<AuthStore>,
        coordinator: Arc<RefreshCoordinator>,
        retry: RetryConfig,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        Self {
            store,
            coordinator,
            retry,
            metrics,
        }
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Run `operation` under `policy`.
    ///
    /// `operation` performs exactly one transport call per invocation and must
    /// build its request from the given [`Attempt`].
    pub async fn execute<T: 'static, F, Fut>(&self, mut operation: F, policy: RequestPolicy<T>) -> ApiResult<T>
    where
        F: FnMut(Attempt) -> Fut,
        Fut: Future<Output = Result<HttpResponse, TransportError>>,
    {
        let cancel = policy.cancel.clone();
        let mut attempt = 0u32;
        let mut replayed = false;
        let mut replay_token: Option<String> = None;

        loop {
            if policy.is_cancelled() {
                return self.fail(ApiError::cancelled());
            }

            let is_replay = replay_token.is_some();
            let access_token = if policy.authenticated {
                match replay_token.take().or_else(|| self.store.access_token()) {
                    Some(token) => Some(token),
                    None => return self.fail(ApiError::not_authenticated()),
                }
            } else {
                None
            };

            if !is_replay {
                attempt += 1;
            }
            self.metrics.record_attempt();

            let call = operation(Attempt {
                number: attempt,
                access_token: access_token.clone(),
                replayed: is_replay,
            });

            let error = match self.send(call, cancel.as_ref()).await {
                Ok(response) if response.is_success() => {
                    let body = ResponseBody::from_response(response.status, &response.body);
                    // Validation failures are final.
                    return match policy.validate(body) {
                        Ok(value) => {
                            self.metrics.record_success();
                            Ok(value)
                        }
                        Err(e) => self.fail(e),
                    };
                }
                Ok(response) => normalize_response(&response),
                Err(e) => e,
            };

            if error.is_cancelled() {
                return self.fail(error);
            }

            if error.code() == ErrorKind::Unauthorized && policy.authenticated && !replayed {
                replayed = true;
                debug!(attempt, "Received 401; waiting for token refresh");
                match self
                    .coordinator
                    .on_unauthorized(access_token.as_deref(), cancel.as_ref())
                    .await
                {
                    Ok(token) => {
                        replay_token = Some(token);
                        continue;
                    }
                    Err(e) => return self.fail(e),
                }
            }

            if !should_retry(&error, policy.idempotent, attempt, policy.retries) {
                return self.fail(error);
            }

            let delay = self.retry.delay_for(&error, attempt, Utc::now());
            debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                code = %error.code(),
                "Retrying after error"
            );
            self.metrics.record_retry();

            if !sleep_unless_cancelled(delay, cancel.as_ref()).await {
                return self.fail(ApiError::cancelled());
            }
        }
    }

    async fn send<Fut>(
        &self,
        call: Fut,
        cancel: Option<&CancellationToken>,
    ) -> ApiResult<HttpResponse>
    where
        Fut: Future<Output = Result<HttpResponse, TransportError>>,
    {
        let result = match cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(TransportError::Cancelled),
                result = call => result,
            },
            None => call.await,
        };
        result.map_err(|e| normalize_transport(&e))
    }

    fn fail<T>(&self, error: ApiError) -> ApiResult<T> {
        self.metrics.record_failure(error.code());
        Err(error)
    }
}

/// Returns `false` if cancelled before `delay` elapsed.
async fn sleep_unless_cancelled(delay: Duration, cancel: Option<&CancellationToken>) -> bool {
    match cancel {
        Some(cancel) => tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        },
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}
