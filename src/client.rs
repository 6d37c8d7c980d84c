//! API Client
//!
//! Wires configuration, transport, session, refresh coordination, and the
//! request executor together, and hands out the per-resource services.

use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::{HttpMethod, HttpRequest, HttpTransport, ReqwestHttpTransport};
use crate::error::{normalize_transport, ApiError, ApiResult, ErrorKind};
use crate::resilience::{Attempt, RequestExecutor, RequestPolicy, RetryConfig};
use crate::services::{ActivitiesService, AuthService, DashboardService, LeadsService};
use crate::telemetry::{ClientMetrics, MetricsSnapshot};
use crate::token::{
    AuthStore, CredentialStorage, HttpTokenRefresher, InMemoryCredentialStorage,
    RefreshCoordinator, TokenRefresher,
};
use crate::types::{ClientConfig, User};

/// Client for the leads API.
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    store: Arc<AuthStore>,
    coordinator: Arc<RefreshCoordinator>,
    executor: RequestExecutor,
    metrics: Arc<ClientMetrics>,
}

impl ApiClient {
    /// Create a client over HTTP with an in-memory session.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        Self::with_storage(config, Arc::new(InMemoryCredentialStorage::new()))
    }

    /// Create a client over HTTP with the given credential storage.
    pub fn with_storage(
        config: ClientConfig,
        storage: Arc<dyn CredentialStorage>,
    ) -> ApiResult<Self> {
        config.validate()?;
        let transport = ReqwestHttpTransport::with_options(
            config.timeout,
            config.max_response_size,
            &config.user_agent,
        )
        .map_err(|e| normalize_transport(&e))?;
        Ok(Self::with_components(config, Arc::new(transport), storage))
    }

    /// Create a client with custom components.
    pub fn with_components(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        storage: Arc<dyn CredentialStorage>,
    ) -> Self {
        let refresher = Arc::new(HttpTokenRefresher::new(transport.clone(), &config));
        Self::with_refresher(config, transport, storage, refresher)
    }

    /// Create a client with a custom token refresher.
    pub fn with_refresher(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        storage: Arc<dyn CredentialStorage>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        let metrics = Arc::new(ClientMetrics::new());
        let store = Arc::new(AuthStore::new(storage));
        let coordinator = Arc::new(RefreshCoordinator::new(
            store.clone(),
            refresher,
            metrics.clone(),
        ));
        let executor = RequestExecutor::new(
            store.clone(),
            coordinator.clone(),
            RetryConfig::with_base_delay(config.retry_base_delay),
            metrics.clone(),
        );

        Self {
            config,
            transport,
            store,
            coordinator,
            executor,
            metrics,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Session holder shared with the refresh coordinator.
    pub fn store(&self) -> &Arc<AuthStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Last-known signed-in user.
    pub fn current_user(&self) -> Option<User> {
        self.store.user()
    }

    /// Reload a persisted session. Returns whether one was found.
    pub async fn restore(&self) -> ApiResult<bool> {
        let restored = self
            .store
            .restore()
            .await
            .map_err(|e| ApiError::new(ErrorKind::Unknown, e.to_string()))?;
        if restored {
            info!("Restored persisted session");
        }
        Ok(restored)
    }

    /// Drop tokens and user together.
    pub async fn logout(&self) {
        self.store.clear().await;
        info!("Logged out");
    }

    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self)
    }

    pub fn leads(&self) -> LeadsService<'_> {
        LeadsService::new(self)
    }

    pub fn activities(&self) -> ActivitiesService<'_> {
        ActivitiesService::new(self)
    }

    pub fn dashboard(&self) -> DashboardService<'_> {
        DashboardService::new(self)
    }

    /// Policy for a safe read: idempotent with the configured retry budget.
    pub fn read_policy<T: 'static>(
        &self,
        policy: RequestPolicy<T>,
        cancel: Option<&CancellationToken>,
    ) -> RequestPolicy<T> {
        self.write_policy(policy, cancel)
            .idempotent(true)
            .retries(self.config.default_retries)
    }

    /// Policy for a write: never retried.
    pub fn write_policy<T: 'static>(
        &self,
        policy: RequestPolicy<T>,
        cancel: Option<&CancellationToken>,
    ) -> RequestPolicy<T> {
        match cancel {
            Some(cancel) => policy.cancel_token(cancel.clone()),
            None => policy,
        }
    }

    /// Serialize a request body.
    pub fn encode<B: Serialize>(body: &B) -> ApiResult<String> {
        serde_json::to_string(body)
            .map_err(|e| ApiError::validation(format!("Failed to encode request body: {}", e)))
    }

    /// Send one logical request through the executor.
    ///
    /// A fresh [`HttpRequest`] is built for every attempt with the token the
    /// executor supplies.
    pub async fn send<T: 'static>(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, String)],
        body: Option<String>,
        policy: RequestPolicy<T>,
    ) -> ApiResult<T> {
        let url = self.build_url(path, query)?;
        debug!(method = method.as_str(), path, "Sending request");

        let transport = self.transport.clone();
        let timeout = self.config.timeout;

        self.executor
            .execute(
                move |attempt: Attempt| {
                    let mut request = HttpRequest::new(method, url.clone())
                        .header("accept", "application/json")
                        .timeout(timeout);
                    if let Some(body) = &body {
                        request = request.json_body(body.clone());
                    }
                    if let Some(token) = &attempt.access_token {
                        request = request.bearer(token);
                    }
                    let transport = transport.clone();
                    async move { transport.send(request).await }
                },
                policy,
            )
            .await
    }

    fn build_url(&self, path: &str, query: &[(&str, String)]) -> ApiResult<String> {
        let raw = self.config.url(path);
        if query.is_empty() {
            return Ok(raw);
        }
        let mut url = url::Url::parse(&raw)
            .map_err(|e| ApiError::validation(format!("Invalid URL {:?}: {}", raw, e)))?;
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url.into())
    }
}

/// Create a client from `LEADS_API_BASE` / `LEADS_API_TIMEOUT_SECS`.
pub fn api_client_from_env() -> ApiResult<ApiClient> {
    ApiClient::new(ClientConfig::from_env()?)
}
