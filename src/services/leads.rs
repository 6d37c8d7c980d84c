//! Lead operations.

use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::core::HttpMethod;
use crate::error::{ApiError, ApiResult};
use crate::resilience::{RequestPolicy, ResponseBody};
use crate::types::{decode_lead, lead_page_decoders, Lead, LeadInput, LeadPage, LeadQuery};

/// Reject ids the backend can never have issued.
pub(crate) fn check_lead_id(id: u64) -> ApiResult<()> {
    if id == 0 {
        return Err(ApiError::validation("Invalid lead id"));
    }
    Ok(())
}

fn lead_policy() -> RequestPolicy<Lead> {
    RequestPolicy::validated(|body: ResponseBody| {
        decode_lead(&body.into_json()?).map_err(ApiError::validation)
    })
}

/// Service for lead operations.
pub struct LeadsService<'a> {
    client: &'a ApiClient,
    cancel: Option<CancellationToken>,
}

impl<'a> LeadsService<'a> {
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

    /// Lists leads matching `query`.
    pub async fn list(&self, query: &LeadQuery) -> ApiResult<LeadPage> {
        let policy = self
            .client
            .read_policy(RequestPolicy::decoders(lead_page_decoders()), self.cancel.as_ref());
        self.client
            .send(HttpMethod::Get, "/leads", &query.to_pairs(), None, policy)
            .await
    }

    /// Gets a lead by id.
    pub async fn get(&self, id: u64) -> ApiResult<Lead> {
        check_lead_id(id)?;
        let policy = self.client.read_policy(lead_policy(), self.cancel.as_ref());
        self.client
            .send(HttpMethod::Get, &format!("/leads/{}", id), &[], None, policy)
            .await
    }

    /// Creates a lead.
    pub async fn create(&self, input: &LeadInput) -> ApiResult<Lead> {
        let body = ApiClient::encode(input)?;
        let policy = self.client.write_policy(lead_policy(), self.cancel.as_ref());
        self.client
            .send(HttpMethod::Post, "/leads", &[], Some(body), policy)
            .await
    }

    /// Updates a lead. Not retried.
    pub async fn update(&self, id: u64, input: &LeadInput) -> ApiResult<Lead> {
        check_lead_id(id)?;
        let body = ApiClient::encode(input)?;
        let policy = self.client.write_policy(lead_policy(), self.cancel.as_ref());
        self.client
            .send(HttpMethod::Put, &format!("/leads/{}", id), &[], Some(body), policy)
            .await
    }

    /// Deletes a lead.
    pub async fn delete(&self, id: u64) -> ApiResult<()> {
        check_lead_id(id)?;
        let policy = self
            .client
            .write_policy(RequestPolicy::no_content(), self.cancel.as_ref());
        self.client
            .send(HttpMethod::Delete, &format!("/leads/{}", id), &[], None, policy)
            .await
    }
}
