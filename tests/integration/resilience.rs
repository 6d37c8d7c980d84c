//! Retry, cancellation, and error normalization over HTTP

use super::*;
use leads_integration::{
    client_config, ErrorKind, LeadInput, LeadQuery, LeadStatus,
};
use std::time::Instant;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};

#[tokio::test]
async fn test_transient_failures_are_retried_for_reads() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/leads/4"))
        .respond_with(error_response(503, "Service Unavailable"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/leads/4"))
        .respond_with(success_response(lead_json(4)))
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", None).await;
    let lead = assert_ok!(client.leads().get(4).await);

    assert_eq!(lead.status, LeadStatus::Qualified);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert_eq!(client.metrics().retries, 2);
}

#[tokio::test]
async fn test_exhausted_retries_surface_server_error() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/leads"))
        .respond_with(error_response(503, "Service Unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", None).await;
    let error = assert_err!(client.leads().list(&LeadQuery::default()).await);

    assert_eq!(error.code(), ErrorKind::Server);
    assert_eq!(error.status(), Some(503));
    assert_eq!(error.message(), "Service Unavailable");
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_writes_are_attempted_once() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/leads"))
        .respond_with(error_response(500, "Internal Server Error"))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", None).await;
    let error = assert_err!(client.leads().create(&LeadInput::default()).await);

    assert_eq!(error.code(), ErrorKind::Server);
    assert_eq!(error.status(), Some(500));
}

#[tokio::test]
async fn test_rate_limit_waits_for_retry_after() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "1")
                .set_body_json(json!({"detail": "Too Many Requests"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(success_response(json!({"total_leads": 3})))
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", None).await;
    let started = Instant::now();
    let stats = assert_ok!(client.dashboard().stats().await);

    assert!(started.elapsed() >= Duration::from_millis(1000));
    assert_eq!(stats.total_leads, 3.0);
}

#[tokio::test]
async fn test_cancellation_is_terminal() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/leads"))
        .respond_with(
            success_response(json!({"items": [], "total": 0})).set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", None).await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let error = assert_err!(
        client
            .leads()
            .with_cancel(cancel)
            .list(&LeadQuery::default())
            .await
    );

    assert!(error.is_cancelled());
    assert!(!error.is_transient());
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(client.metrics().retries, 0);
}

#[tokio::test]
async fn test_validation_errors_carry_details() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/leads"))
        .respond_with(
            ResponseTemplate::new(422)
                .insert_header("X-Request-Id", "req-123")
                .set_body_json(json!({
                    "detail": [
                        {"loc": ["body", "email"], "msg": "value is not a valid email address", "type": "value_error"}
                    ]
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", None).await;
    let input = LeadInput {
        email: Some("nope".to_string()),
        ..Default::default()
    };
    let error = assert_err!(client.leads().create(&input).await);

    assert_eq!(error.code(), ErrorKind::Validation);
    assert_eq!(error.message(), "value is not a valid email address");
    assert_eq!(error.request_id(), Some("req-123"));
    assert!(error.details().unwrap()["detail"].is_array());
}

#[tokio::test]
async fn test_invalid_success_body_is_not_retried() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/leads/4"))
        .respond_with(success_response(json!({"unexpected": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", None).await;
    let error = assert_err!(client.leads().get(4).await);

    assert_eq!(error.code(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_client_timeout() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(success_response(json!({})).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = client_config()
        .base_url(server.uri())
        .timeout(Duration::from_millis(200))
        .retry_base_delay(Duration::from_millis(5))
        .default_retries(1)
        .build()
        .unwrap();
    let client = ApiClient::with_storage(config, Arc::new(InMemoryCredentialStorage::new())).unwrap();
    client.store().set(AuthTokens::new("t1", None)).await;

    let error = assert_err!(client.dashboard().stats().await);

    assert_eq!(error.code(), ErrorKind::Timeout);
    assert_eq!(client.metrics().attempts, 2);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let config = client_config()
        .base_url("http://127.0.0.1:9")
        .retry_base_delay(Duration::from_millis(1))
        .build()
        .unwrap();
    let client = ApiClient::with_storage(config, Arc::new(InMemoryCredentialStorage::new())).unwrap();
    client.store().set(AuthTokens::new("t1", None)).await;

    let error = assert_err!(client.leads().get(1).await);

    assert_eq!(error.code(), ErrorKind::Network);
    assert_eq!(client.metrics().attempts, 3);
}
