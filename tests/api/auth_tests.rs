//! Authentication API Tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{read_json, TestApp, ADMIN_EMAIL};

/// Test user registration with valid data
#[tokio::test]
async fn test_register_with_valid_data() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/v1/auth/register",
            json!({
                "username": "anna",
                "email": "anna@example.com",
                "password": "ValidPassword123!"
            }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["user"]["username"], "anna");
    assert_eq!(body["user"]["is_admin"], false);
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].as_str().is_some());
    assert!(body["user"].get("password_hash").is_none());
}

/// Test registration fails with invalid email
#[tokio::test]
async fn test_register_with_invalid_email_fails() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/v1/auth/register",
            json!({
                "username": "anna",
                "email": "not-an-email",
                "password": "ValidPassword123!"
            }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Test registration fails with short password
#[tokio::test]
async fn test_register_with_short_password_fails() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/v1/auth/register",
            json!({
                "username": "anna",
                "email": "anna@example.com",
                "password": "short"
            }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Test registration with an existing email is a conflict
#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/v1/auth/register",
            json!({
                "username": "someone",
                "email": ADMIN_EMAIL,
                "password": "ValidPassword123!"
            }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Test login with wrong password is rejected
#[tokio::test]
async fn test_login_with_wrong_password_fails() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Invalid email or password");
}

/// Test the current user endpoint with and without a token
#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/api/v1/auth/me", Some("garbage")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = app.admin_token().await;
    let response = app.get("/api/v1/auth/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert_eq!(body["is_admin"], true);
}
