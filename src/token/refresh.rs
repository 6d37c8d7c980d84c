//! Token Refresh
//!
//! Single-flight refresh of the access token. The first request to see a 401
//! starts the refresh; every 401 that arrives while it is in flight waits for
//! the same outcome instead of issuing a call of its own.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::store::{AuthStore, AuthTokens};
use crate::core::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::{normalize_response, normalize_transport, ApiError, ApiResult, ErrorKind};
use crate::telemetry::ClientMetrics;
use crate::types::{ClientConfig, RefreshRequest, RefreshResponse};

/// Path of the refresh endpoint, relative to the base URL.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Exchanges a refresh token for a new access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshResponse>;
}

/// Refresher calling `POST /auth/refresh`.
///
/// The call carries no bearer token and never goes through the refresh path
/// itself.
pub struct HttpTokenRefresher {
    transport: Arc<dyn HttpTransport>,
    url: String,
    timeout: Duration,
}

impl HttpTokenRefresher {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            url: config.url(REFRESH_PATH),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshResponse> {
        let body = serde_json::to_string(&RefreshRequest { refresh_token })
            .map_err(|e| ApiError::new(ErrorKind::Unknown, e.to_string()))?;

        let request = HttpRequest::new(HttpMethod::Post, self.url.clone())
            .header("accept", "application/json")
            .json_body(body)
            .timeout(self.timeout);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| normalize_transport(&e))?;

        if !response.is_success() {
            return Err(normalize_response(&response));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            ApiError::validation(format!("Invalid refresh response: {}", e)).with_status(response.status)
        })
    }
}

/// Refresh coordinator state. Only mutated under the coordinator's mutex.
#[derive(Debug, Default)]
pub enum RefreshState {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<ApiResult<String>>>,
    },
}

/// Serializes refreshes and fans the outcome out to every waiting request.
pub struct RefreshCoordinator {
    store: Arc<AuthStore>,
    refresher: Arc<dyn TokenRefresher>,
    metrics: Arc<ClientMetrics>,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<AuthStore>,
        refresher: Arc<dyn TokenRefresher>,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        Self {
            store,
            refresher,
            metrics,
            state: Mutex::new(RefreshState::Idle),
        }
    }

    /// Whether a refresh call is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.state
            .lock()
            .map(|s| matches!(*s, RefreshState::Refreshing { .. }))
            .unwrap_or(false)
    }

    /// Handle a 401 for a request that was sent with `stale_token`.
    ///
    /// Returns the access token to replay with. The refresh itself runs on its
    /// own task, so cancelling the caller only abandons the wait.
    pub async fn on_unauthorized(
        self: &Arc<Self>,
        stale_token: Option<&str>,
        cancel: Option<&CancellationToken>,
    ) -> ApiResult<String> {
        let receiver = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| ApiError::new(ErrorKind::Unknown, "Refresh state poisoned"))?;

            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    debug!(waiters = waiters.len() + 1, "Waiting for in-flight token refresh");
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    rx
                }
                RefreshState::Idle => {
                    // Already refreshed by someone else since this request was sent.
                    if let Some(current) = self.store.access_token() {
                        if stale_token != Some(current.as_str()) {
                            return Ok(current);
                        }
                    }

                    let (tx, rx) = oneshot::channel();
                    *state = RefreshState::Refreshing { waiters: vec![tx] };

                    let this = Arc::clone(self);
                    tokio::spawn(async move { this.run().await });
                    rx
                }
            }
        };

        let outcome = match cancel {
            Some(cancel) => tokio::select! {
                _ = cancel.cancelled() => return Err(ApiError::cancelled()),
                outcome = receiver => outcome,
            },
            None => receiver.await,
        };

        outcome.unwrap_or_else(|_| {
            Err(ApiError::new(
                ErrorKind::Unauthorized,
                "Token refresh was abandoned",
            ))
        })
    }

    async fn run(&self) {
        let guard = SettleOnDrop {
            state: &self.state,
            armed: true,
        };
        let result = self.refresh_once().await;

        for waiter in guard.settle() {
            // A dropped receiver means that caller was cancelled.
            let _ = waiter.send(result.clone());
        }
    }

    async fn refresh_once(&self) -> ApiResult<String> {
        let Some(refresh_token) = self.store.get().and_then(|t| t.refresh_token) else {
            warn!("No refresh token available; clearing session");
            self.store.clear().await;
            return Err(ApiError::new(
                ErrorKind::Unauthorized,
                "Session expired. Please sign in again.",
            ));
        };

        self.metrics.record_refresh();

        match self.refresher.refresh(&refresh_token).await {
            Ok(response) => {
                let access_token = response.access_token;
                let rotated = response.refresh_token.is_some();
                self.store
                    .set(AuthTokens::new(
                        access_token.clone(),
                        response.refresh_token.or(Some(refresh_token)),
                    ))
                    .await;
                info!(rotated, "Access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                self.metrics.record_refresh_failure();
                warn!(code = %e.code(), status = ?e.status(), "Token refresh failed; clearing session");
                self.store.clear().await;
                Err(refresh_failure(e))
            }
        }
    }
}

/// Returns the coordinator to `Idle` even if the refresh task panics or is
/// dropped. Waiters left behind see their sender dropped.
struct SettleOnDrop<'a> {
    state: &'a Mutex<RefreshState>,
    armed: bool,
}

impl SettleOnDrop<'_> {
    /// Hand the waiters over for a normal settle and disarm the guard.
    fn settle(mut self) -> Vec<oneshot::Sender<ApiResult<String>>> {
        self.armed = false;
        self.take_waiters()
    }

    fn take_waiters(&self) -> Vec<oneshot::Sender<ApiResult<String>>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match mem::take(&mut *state) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        }
    }
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let abandoned = self.take_waiters();
        if !abandoned.is_empty() {
            warn!(waiters = abandoned.len(), "Token refresh abandoned");
        }
    }
}

/// Refresh failures surface as UNAUTHORIZED unless the server was unreachable.
fn refresh_failure(error: ApiError) -> ApiError {
    match error.code() {
        ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Server => error,
        _ => {
            let mut unauthorized =
                ApiError::new(ErrorKind::Unauthorized, "Session expired. Please sign in again.");
            if let Some(status) = error.status() {
                unauthorized = unauthorized.with_status(status);
            }
            if let Some(request_id) = error.request_id() {
                unauthorized = unauthorized.with_request_id(request_id);
            }
            unauthorized
        }
    }
}

/// Mock refresher for testing.
///
/// Outcomes are served in queue order; an empty queue answers UNAUTHORIZED.
#[derive(Default)]
pub struct MockTokenRefresher {
    responses: Mutex<VecDeque<ApiResult<RefreshResponse>>>,
    seen: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl MockTokenRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful refresh.
    pub fn queue_success(&self, access_token: &str, refresh_token: Option<&str>) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(RefreshResponse {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
        }));
        self
    }

    /// Queue a failed refresh.
    pub fn queue_error(&self, error: ApiError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Delay every refresh by `delay`.
    pub fn set_delay(&self, delay: Duration) -> &Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh tokens received, in call order.
    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRefresher for MockTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(refresh_token.to_string());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ApiError::new(ErrorKind::Unauthorized, "No mock refresh response").with_status(401))
        })
    }
}
