//! Integration tests using WireMock
//!
//! These tests drive the client over real HTTP against a mock server: retry,
//! refresh coordination, error normalization, and the resource services.

mod refresh;
mod resilience;
mod services;
mod session;

use leads_integration::{
    client_config, ApiClient, AuthTokens, CredentialStorage, InMemoryCredentialStorage,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to start a mock server
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at `server` with a fast backoff.
pub fn client_for(server: &MockServer, storage: Arc<dyn CredentialStorage>) -> ApiClient {
    let config = client_config()
        .base_url(server.uri())
        .retry_base_delay(Duration::from_millis(5))
        .timeout(Duration::from_secs(5))
        .build()
        .expect("valid config");
    ApiClient::with_storage(config, storage).expect("client")
}

/// Client already holding `access` / `refresh` tokens.
pub async fn logged_in_client(server: &MockServer, access: &str, refresh: Option<&str>) -> ApiClient {
    let client = client_for(server, Arc::new(InMemoryCredentialStorage::new()));
    client
        .store()
        .set(AuthTokens::new(access, refresh.map(str::to_string)))
        .await;
    client
}

/// Mock requiring `Authorization: Bearer <token>`.
pub fn mock_with_auth(method_matcher: &str, path_matcher: &str, token: &str) -> wiremock::MockBuilder {
    Mock::given(method(method_matcher))
        .and(path(path_matcher))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
}

pub fn lead_json(id: u64) -> Value {
    json!({
        "id": id,
        "first_name": "Michael",
        "last_name": "Chen",
        "email": "mchen@example.com",
        "phone": "+1-555-0102",
        "status": "qualified",
        "source": "zillow",
        "budget_min": 400000,
        "budget_max": 550000,
        "is_active": true,
        "activity_count": 6
    })
}

pub fn user_json() -> Value {
    json!({
        "id": 7,
        "username": "agent",
        "email": "agent@example.com",
        "first_name": "Agent",
        "last_name": "Smith"
    })
}

pub fn success_response(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

pub fn error_response(status: u16, detail: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "detail": detail }))
}
