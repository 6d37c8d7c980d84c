//! Resource services end to end

use super::*;
use leads_integration::{
    ActivityInput, ActivityType, ErrorKind, LeadInput, LeadQuery, LeadStatus,
};
use wiremock::matchers::{body_json, method, path, query_param};

#[tokio::test]
async fn test_login_then_list_leads() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(body_json(json!({"username": "agent", "password": "hunter22"})))
        .respond_with(success_response(json!({
            "access_token": "t1",
            "token_type": "bearer",
            "refresh_token": "r1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mock_with_auth("GET", "/users/me", "t1")
        .respond_with(success_response(json!({ "user": user_json() })))
        .expect(1)
        .mount(&server)
        .await;
    mock_with_auth("GET", "/leads", "t1")
        .and(query_param("search", "chen"))
        .and(query_param("page", "1"))
        .respond_with(success_response(json!([lead_json(3)])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCredentialStorage::new()));
    let outcome = client.auth().login("agent", "hunter22").await.unwrap();

    assert_eq!(outcome.access_token, "t1");
    assert_eq!(outcome.user.as_ref().map(|u| u.display_name()), Some("Agent Smith".to_string()));
    assert_eq!(client.current_user().map(|u| u.id), Some(7));

    let page = client
        .leads()
        .list(&LeadQuery {
            search: Some("chen".to_string()),
            page: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.leads[0].full_name(), "Michael Chen");
}

#[tokio::test]
async fn test_logout_fails_fast_afterwards() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(success_response(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", Some("r1")).await;
    client.auth().logout().await;

    let error = client.dashboard().stats().await.unwrap_err();
    assert_eq!(error.code(), ErrorKind::Unauthorized);
    assert_eq!(error.message(), "Not authenticated");
}

#[tokio::test]
async fn test_lead_crud() {
    let server = setup_mock_server().await;

    mock_with_auth("POST", "/leads", "t1")
        .and(body_json(json!({"first_name": "Michael", "last_name": "Chen"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(lead_json(3)))
        .expect(1)
        .mount(&server)
        .await;
    mock_with_auth("PUT", "/leads/3", "t1")
        .and(body_json(json!({"status": "negotiation"})))
        .respond_with(success_response({
            let mut lead = lead_json(3);
            lead["status"] = json!("negotiation");
            lead
        }))
        .expect(1)
        .mount(&server)
        .await;
    mock_with_auth("DELETE", "/leads/3", "t1")
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", None).await;

    let created = client
        .leads()
        .create(&LeadInput {
            first_name: Some("Michael".to_string()),
            last_name: Some("Chen".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.id, 3);

    let updated = client
        .leads()
        .update(
            3,
            &LeadInput {
                status: Some(LeadStatus::Negotiation),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, LeadStatus::Negotiation);

    client.leads().delete(3).await.unwrap();
}

#[tokio::test]
async fn test_missing_lead() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/leads/99"))
        .respond_with(error_response(404, "Lead not found"))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", None).await;
    let error = client.leads().get(99).await.unwrap_err();

    assert_eq!(error.code(), ErrorKind::NotFound);
    assert_eq!(error.message(), "Lead not found");
    assert!(!error.is_transient());
}

#[tokio::test]
async fn test_activities() {
    let server = setup_mock_server().await;

    mock_with_auth("GET", "/leads/1/activities", "t1")
        .respond_with(success_response(json!([
            {
                "id": 1,
                "lead_id": 1,
                "user_id": 1,
                "activity_type": "call",
                "title": "Initial consultation call",
                "duration": 30,
                "activity_date": "2025-01-10",
                "user_name": "Agent Smith"
            },
            {"id": 2, "lead_id": 1, "activity_type": "email", "title": "Sent property listings"}
        ])))
        .mount(&server)
        .await;
    mock_with_auth("POST", "/leads/1/activities", "t1")
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 3,
            "lead_id": 1,
            "activity_type": "note",
            "title": "Prefers afternoon calls",
            "activity_date": "2025-01-12"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", None).await;

    let activities = client.activities().list(1).await.unwrap();
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0].duration, Some(30.0));
    assert_eq!(activities[1].user_name, "Unknown User");

    let created = client
        .activities()
        .create(
            1,
            &ActivityInput {
                activity_type: ActivityType::Note,
                title: "Prefers afternoon calls".to_string(),
                notes: None,
                duration: None,
                activity_date: "2025-01-12".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.id, 3);
    assert_eq!(created.activity_type, ActivityType::Note);
}

#[tokio::test]
async fn test_dashboard_shapes() {
    let server = setup_mock_server().await;

    mock_with_auth("GET", "/dashboard", "t1")
        .respond_with(success_response(json!({
            "total_leads": 5,
            "new_leads": 1,
            "closed_leads": "1",
            "conversion_rate": 20.0,
            "leads_by_status": {"new": 1, "contacted": 1, "qualified": 1, "negotiation": 1, "closed": 1},
            "recent_activities": [
                {"id": 1, "activity_type": "call", "title": "Initial consultation call"}
            ]
        })))
        .mount(&server)
        .await;

    let client = logged_in_client(&server, "t1", None).await;
    let stats = client.dashboard().stats().await.unwrap();

    assert_eq!(stats.total_leads, 5.0);
    assert_eq!(stats.closed_leads, 1.0);
    assert_eq!(stats.leads_by_status.len(), 5);
    assert_eq!(stats.recent_activities[0].activity_type, ActivityType::Call);
}
