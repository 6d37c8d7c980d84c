//! Session persistence

use super::*;
use leads_integration::{FileCredentialStorage, PersistedSession};
use wiremock::matchers::{method, path};

#[tokio::test]
async fn test_session_survives_restart() {
    let server = setup_mock_server().await;
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");

    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(success_response(json!({"access_token": "t1", "refresh_token": "r1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(success_response(user_json()))
        .mount(&server)
        .await;

    let first = client_for(&server, Arc::new(FileCredentialStorage::new(&session_path)));
    first.auth().login("agent", "hunter22").await.unwrap();
    assert!(session_path.exists());

    let second = client_for(&server, Arc::new(FileCredentialStorage::new(&session_path)));
    assert!(!second.is_authenticated());
    assert!(second.restore().await.unwrap());

    let tokens = second.store().get().unwrap();
    assert_eq!(tokens.access_token, "t1");
    assert_eq!(tokens.refresh_token.as_deref(), Some("r1"));
    assert_eq!(second.current_user().map(|u| u.username), Some("agent".to_string()));

    second.logout().await;
    assert!(!session_path.exists());
}

#[tokio::test]
async fn test_refresh_is_persisted() {
    let server = setup_mock_server().await;
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileCredentialStorage::new(dir.path().join("session.json")));

    mock_with_auth("GET", "/leads/1", "old")
        .respond_with(error_response(401, "Token expired"))
        .mount(&server)
        .await;
    mock_with_auth("GET", "/leads/1", "new")
        .respond_with(success_response(lead_json(1)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(success_response(json!({"access_token": "new"})))
        .mount(&server)
        .await;

    let client = client_for(&server, storage.clone());
    client
        .store()
        .set(AuthTokens::new("old", Some("r1".to_string())))
        .await;

    client.leads().get(1).await.unwrap();

    let persisted: PersistedSession = storage.load().await.unwrap().unwrap();
    assert_eq!(persisted.access_token.as_deref(), Some("new"));
    assert_eq!(persisted.refresh_token.as_deref(), Some("r1"));
}

#[tokio::test]
async fn test_restore_without_file() {
    let server = setup_mock_server().await;
    let dir = tempfile::tempdir().unwrap();

    let client = client_for(
        &server,
        Arc::new(FileCredentialStorage::new(dir.path().join("missing.json"))),
    );
    assert!(!client.restore().await.unwrap());
    assert!(!client.is_authenticated());
}
