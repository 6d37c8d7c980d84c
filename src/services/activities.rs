//! Activity operations.

use tokio_util::sync::CancellationToken;

use super::leads::check_lead_id;
use crate::client::ApiClient;
use crate::core::HttpMethod;
use crate::error::{ApiError, ApiResult};
use crate::resilience::{RequestPolicy, ResponseBody};
use crate::types::{decode_activities, Activity, ActivityInput};

/// Service for the activity log of a lead.
pub struct ActivitiesService<'a> {
    client: &'a ApiClient,
    cancel: Option<CancellationToken>,
}

impl<'a> ActivitiesService<'a> {
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

    /// Lists the activities of a lead.
    pub async fn list(&self, lead_id: u64) -> ApiResult<Vec<Activity>> {
        check_lead_id(lead_id)?;
        let policy = self.client.read_policy(
            RequestPolicy::validated(|body: ResponseBody| {
                decode_activities(&body.into_json()?).map_err(ApiError::validation)
            }),
            self.cancel.as_ref(),
        );
        self.client
            .send(
                HttpMethod::Get,
                &format!("/leads/{}/activities", lead_id),
                &[],
                None,
                policy,
            )
            .await
    }

    /// Logs an activity against a lead.
    pub async fn create(&self, lead_id: u64, input: &ActivityInput) -> ApiResult<Activity> {
        check_lead_id(lead_id)?;
        let body = ApiClient::encode(input)?;
        let policy = self.client.write_policy(
            RequestPolicy::validated(|body: ResponseBody| {
                Activity::from_value(&body.into_json()?).map_err(ApiError::validation)
            }),
            self.cancel.as_ref(),
        );
        self.client
            .send(
                HttpMethod::Post,
                &format!("/leads/{}/activities", lead_id),
                &[],
                Some(body),
                policy,
            )
            .await
    }
}
