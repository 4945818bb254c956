//! Tour API Tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{read_json, tour_body, TestApp};

#[tokio::test]
async fn test_created_tour_starts_fully_available() {
    let app = TestApp::new().await;
    let id = app.create_tour("Altai rafting", 12).await;

    let response = app.get(&format!("/api/v1/tours/{}", id), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["title"], "Altai rafting");
    assert_eq!(body["max_participants"], 12);
    assert_eq!(body["available_spots"], 12);
}

#[tokio::test]
async fn test_tour_writes_require_admin() {
    let app = TestApp::new().await;
    let user = app.register_user("anna").await;

    let response = app
        .post("/api/v1/tours", tour_body("Sea", 5), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post("/api/v1/tours", tour_body("Sea", 5), Some(&user))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_tour_with_more_spots_than_seats_is_rejected() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let mut body = tour_body("Sea", 5);
    body["available_spots"] = json!(6);

    let response = app.post("/api/v1/tours", body, Some(&token)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_and_malformed_tour_ids() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/tours/999", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/v1/tours/abc", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hot_and_popular_listings() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    app.create_tour("Small", 2).await;
    app.create_tour("Large", 30).await;
    let mut hot = tour_body("Hot deal", 10);
    hot["is_hot"] = json!(true);
    let response = app.post("/api/v1/tours", hot, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(app.get("/api/v1/tours/hot", None).await).await;
    let titles: Vec<_> = body.as_array().unwrap().iter().map(|t| t["title"].clone()).collect();
    assert_eq!(titles, vec![json!("Hot deal")]);

    let body = read_json(app.get("/api/v1/tours/popular?limit=2", None).await).await;
    let titles: Vec<_> = body.as_array().unwrap().iter().map(|t| t["title"].clone()).collect();
    assert_eq!(titles, vec![json!("Large"), json!("Hot deal")]);

    let body = read_json(app.get("/api/v1/tours?skip=1&limit=1", None).await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_and_delete_tour() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let id = app.create_tour("Altai rafting", 12).await;
    let uri = format!("/api/v1/tours/{}", id);

    let response = app
        .put(&uri, tour_body("Altai rafting deluxe", 8), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["title"], "Altai rafting deluxe");
    assert_eq!(body["available_spots"], 8);

    let response = app.request("DELETE", &uri, None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get(&uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tour_with_requests_cannot_be_deleted() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let user = app.register_user("anna").await;
    let id = app.create_tour("Altai rafting", 12).await;
    let response = app
        .post("/api/v1/requests", json!({ "tour_id": id }), Some(&user))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request("DELETE", &format!("/api/v1/tours/{}", id), None, Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}
