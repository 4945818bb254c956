//! Travel Request API Tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use tour_booking::domain::{RequestEventKind, RequestStatus, RequesterIdentity};

use crate::common::{read_json, TestApp};

async fn submit(app: &TestApp, tour_id: &str, token: &str) -> Value {
    let response = app
        .post(
            "/api/v1/requests",
            json!({ "tour_id": tour_id, "comment": "Two adults" }),
            Some(token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

async fn spots(app: &TestApp, tour_id: &str) -> i64 {
    let body = read_json(app.get(&format!("/api/v1/tours/{}", tour_id), None).await).await;
    body["available_spots"].as_i64().unwrap()
}

fn status_uri(request: &Value) -> String {
    format!("/api/v1/requests/{}/status", request["id"].as_str().unwrap())
}

#[tokio::test]
async fn test_user_request_is_pending_and_notified() {
    let app = TestApp::new().await;
    let tour = app.create_tour("Altai rafting", 4).await;
    let user = app.register_user("anna").await;

    let request = submit(&app, &tour, &user).await;

    assert_eq!(request["status"], "pending");
    assert_eq!(request["comment"], "Two adults");
    assert!(request["user_id"].is_string());
    assert_eq!(request["guest_name"], Value::Null);

    let events = app.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, RequestEventKind::Created);
    assert_eq!(events[0].tour_title, "Altai rafting");
    assert!(matches!(
        &events[0].requester,
        RequesterIdentity::User { username, .. } if username == "anna"
    ));
}

#[tokio::test]
async fn test_guest_request_without_account() {
    let app = TestApp::new().await;
    let tour = app.create_tour("Altai rafting", 4).await;

    let response = app
        .post(
            "/api/v1/requests/guest",
            json!({
                "tour_id": tour,
                "guest_name": "Ivan",
                "guest_email": "ivan@example.com",
                "guest_phone": "+7 999 123 45 67",
            }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["user_id"], Value::Null);
    assert_eq!(body["guest_name"], "Ivan");
    assert_eq!(body["status"], "pending");

    let events = app.events.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0].requester,
        RequesterIdentity::Guest(contact) if contact.email == "ivan@example.com"
    ));
}

#[tokio::test]
async fn test_guest_request_validation_and_unknown_tour() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/v1/requests/guest",
            json!({
                "tour_id": "1",
                "guest_name": "Ivan",
                "guest_email": "not-an-email",
                "guest_phone": "+7 999",
            }),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post(
            "/api/v1/requests/guest",
            json!({
                "tour_id": "1",
                "guest_name": "Ivan",
                "guest_email": "ivan@example.com",
                "guest_phone": "+7 999",
            }),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_listing_visibility() {
    let app = TestApp::new().await;
    let tour = app.create_tour("Altai rafting", 4).await;
    let anna = app.register_user("anna").await;
    let boris = app.register_user("boris").await;
    let admin = app.admin_token().await;
    let request = submit(&app, &tour, &anna).await;
    submit(&app, &tour, &boris).await;

    let mine = read_json(app.get("/api/v1/requests/my", Some(&anna)).await).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let response = app.get("/api/v1/requests", Some(&anna)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let all = read_json(app.get("/api/v1/requests", Some(&admin)).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let uri = format!("/api/v1/requests/{}", request["id"].as_str().unwrap());
    let response = app.get(&uri, Some(&boris)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.get(&uri, Some(&anna)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_admin_cannot_change_status() {
    let app = TestApp::new().await;
    let tour = app.create_tour("Altai rafting", 4).await;
    let user = app.register_user("anna").await;
    let request = submit(&app, &tour, &user).await;

    let response = app
        .put(&status_uri(&request), json!({ "status": "approved" }), Some(&user))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(spots(&app, &tour).await, 4);
}

#[tokio::test]
async fn test_non_admin_is_forbidden_before_payload_checks() {
    let app = TestApp::new().await;
    let tour = app.create_tour("Altai rafting", 4).await;
    let user = app.register_user("anna").await;
    let request = submit(&app, &tour, &user).await;
    let uri = status_uri(&request);

    for body in [json!({ "status": 7 }), json!({}), json!({ "status": "archived" })] {
        let response = app.put(&uri, body, Some(&user)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    let response = app
        .put("/api/v1/requests/not-an-id/status", json!({ "status": 7 }), Some(&user))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(spots(&app, &tour).await, 4);
}

#[tokio::test]
async fn test_malformed_status_body_is_a_json_error() {
    let app = TestApp::new().await;
    let tour = app.create_tour("Altai rafting", 4).await;
    let user = app.register_user("anna").await;
    let admin = app.admin_token().await;
    let request = submit(&app, &tour, &user).await;

    let response = app
        .put(&status_uri(&request), json!({ "status": 7 }), Some(&admin))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], 10002);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_invalid_status_is_rejected() {
    let app = TestApp::new().await;
    let tour = app.create_tour("Altai rafting", 4).await;
    let user = app.register_user("anna").await;
    let admin = app.admin_token().await;
    let request = submit(&app, &tour, &user).await;

    let response = app
        .put(&status_uri(&request), json!({ "status": "archived" }), Some(&admin))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(spots(&app, &tour).await, 4);
}

#[tokio::test]
async fn test_approval_consumes_and_unapproval_restores_spot() {
    let app = TestApp::new().await;
    let tour = app.create_tour("Altai rafting", 2).await;
    let user = app.register_user("anna").await;
    let admin = app.admin_token().await;
    let request = submit(&app, &tour, &user).await;

    let response = app
        .put(&status_uri(&request), json!({ "status": "approved" }), Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "approved");
    assert_eq!(spots(&app, &tour).await, 1);

    // Approving again changes nothing
    let response = app
        .put(&status_uri(&request), json!({ "status": "approved" }), Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(spots(&app, &tour).await, 1);

    let response = app
        .put(&status_uri(&request), json!({ "status": "rejected" }), Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(spots(&app, &tour).await, 2);

    let statuses: Vec<_> = app
        .events
        .events()
        .iter()
        .filter(|e| e.kind == RequestEventKind::StatusChanged)
        .map(|e| e.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            RequestStatus::Approved,
            RequestStatus::Approved,
            RequestStatus::Rejected
        ]
    );
}

#[tokio::test]
async fn test_approval_without_capacity_conflicts() {
    let app = TestApp::new().await;
    let tour = app.create_tour("Altai rafting", 1).await;
    let anna = app.register_user("anna").await;
    let boris = app.register_user("boris").await;
    let admin = app.admin_token().await;
    let first = submit(&app, &tour, &anna).await;
    let second = submit(&app, &tour, &boris).await;

    let response = app
        .put(&status_uri(&first), json!({ "status": "approved" }), Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .put(&status_uri(&second), json!({ "status": "approved" }), Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let uri = format!("/api/v1/requests/{}", second["id"].as_str().unwrap());
    let body = read_json(app.get(&uri, Some(&admin)).await).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(spots(&app, &tour).await, 0);
}

#[tokio::test]
async fn test_full_tour_refuses_new_requests() {
    let app = TestApp::new().await;
    let tour = app.create_tour("Altai rafting", 1).await;
    let anna = app.register_user("anna").await;
    let boris = app.register_user("boris").await;
    let admin = app.admin_token().await;
    let request = submit(&app, &tour, &anna).await;
    app.put(&status_uri(&request), json!({ "status": "approved" }), Some(&admin))
        .await;

    let response = app
        .post("/api/v1/requests", json!({ "tour_id": tour }), Some(&boris))
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_take_the_last_spot_once() {
    let app = TestApp::new().await;
    let tour = app.create_tour("Altai rafting", 1).await;
    let admin = app.admin_token().await;
    let mut requests = Vec::new();
    for name in ["anna", "boris", "clara", "denis"] {
        let token = app.register_user(name).await;
        requests.push(submit(&app, &tour, &token).await);
    }

    let uris: Vec<String> = requests.iter().map(status_uri).collect();
    let approvals = uris
        .iter()
        .map(|uri| app.put(uri, json!({ "status": "approved" }), Some(&admin)));
    let statuses: Vec<_> = futures::future::join_all(approvals)
        .await
        .into_iter()
        .map(|response| response.status())
        .collect();

    let approved = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let refused = statuses
        .iter()
        .filter(|s| **s == StatusCode::CONFLICT)
        .count();
    assert_eq!(approved, 1);
    assert_eq!(refused, 3);
    assert_eq!(spots(&app, &tour).await, 0);
}
