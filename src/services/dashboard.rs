//! Dashboard operations.

use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::core::HttpMethod;
use crate::error::ApiResult;
use crate::resilience::{RequestPolicy, ResponseBody};
use crate::types::DashboardStats;

/// Service for dashboard statistics.
pub struct DashboardService<'a> {
    client: &'a ApiClient,
    cancel: Option<CancellationToken>,
}

impl<'a> DashboardService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            cancel: None,
        }
    }

    /// Cancel this service's requests with `cancel`.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Gets normalized dashboard statistics. Malformed payloads yield zeros.
    pub async fn stats(&self) -> ApiResult<DashboardStats> {
        let policy = self.client.read_policy(
            RequestPolicy::validated(|body: ResponseBody| {
                Ok(body
                    .as_json()
                    .map(DashboardStats::from_value)
                    .unwrap_or_default())
            }),
            self.cancel.as_ref(),
        );
        self.client
            .send(HttpMethod::Get, "/dashboard", &[], None, policy)
            .await
    }
}
