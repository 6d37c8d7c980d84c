//! Refresh coordination over HTTP

use super::*;
use futures::future::join_all;
use leads_integration::{ErrorKind, LeadQuery};
use wiremock::matchers::{body_json, method, path};

#[tokio::test]
async fn test_concurrent_unauthorized_trigger_single_refresh() {
    let server = setup_mock_server().await;

    mock_with_auth("GET", "/leads", "old")
        .respond_with(error_response(401, "Token expired"))
        .mount(&server)
        .await;
    mock_with_auth("GET", "/leads", "new")
        .respond_with(success_response(json!({"items": [lead_json(1)], "total": 1})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refresh_token": "r1"})))
        .respond_with(
            success_response(json!({"access_token": "new"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "old", Some("r1")).await;
    let query = LeadQuery::default();

    let results = join_all((0..5).map(|_| async { client.leads().list(&query).await })).await;

    for result in results {
        let page = result.expect("replayed request succeeds");
        assert_eq!(page.total, 1);
    }
    let tokens = client.store().get().unwrap();
    assert_eq!(tokens.access_token, "new");
    assert_eq!(tokens.refresh_token.as_deref(), Some("r1"));
    assert_eq!(client.metrics().refresh_calls, 1);
}

#[tokio::test]
async fn test_rotated_refresh_token_is_kept() {
    let server = setup_mock_server().await;

    mock_with_auth("GET", "/users/me", "old")
        .respond_with(error_response(401, "Token expired"))
        .mount(&server)
        .await;
    mock_with_auth("GET", "/users/me", "new")
        .respond_with(success_response(user_json()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(success_response(
            json!({"access_token": "new", "refresh_token": "r2"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "old", Some("r1")).await;
    let user = client.auth().me().await.unwrap();

    assert_eq!(user.username, "agent");
    assert_eq!(
        client.store().get().unwrap().refresh_token.as_deref(),
        Some("r2")
    );
}

#[tokio::test]
async fn test_failed_refresh_rejects_every_waiter() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(error_response(401, "Token expired"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            error_response(401, "Refresh token expired").set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "old", Some("r1")).await;

    let results = join_all((0..3).map(|_| async { client.dashboard().stats().await })).await;

    for result in results {
        let error = result.unwrap_err();
        assert_eq!(error.code(), ErrorKind::Unauthorized);
        assert!(error.needs_reauth());
    }
    assert!(client.store().get().is_none());
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_second_unauthorized_after_replay_is_terminal() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(error_response(401, "User disabled"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(success_response(json!({"access_token": "new"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "old", Some("r1")).await;
    let error = client.auth().me().await.unwrap_err();

    assert_eq!(error.code(), ErrorKind::Unauthorized);
    assert_eq!(error.message(), "User disabled");
    assert_eq!(error.status(), Some(401));
}

#[tokio::test]
async fn test_refresh_unreachable_keeps_network_kind() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/leads/3"))
        .respond_with(error_response(401, "Token expired"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(error_response(503, "Service Unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "old", Some("r1")).await;
    let error = client.leads().get(3).await.unwrap_err();

    assert_eq!(error.code(), ErrorKind::Server);
    assert!(client.store().get().is_none());
}

#[tokio::test]
async fn test_missing_refresh_token_skips_refresh_call() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/leads/3"))
        .respond_with(error_response(401, "Token expired"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(success_response(json!({"access_token": "new"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "old", None).await;
    let error = client.leads().get(3).await.unwrap_err();

    assert_eq!(error.code(), ErrorKind::Unauthorized);
    assert!(!client.is_authenticated());
}
