//! Health Check API Tests

use axum::http::StatusCode;

use crate::common::{read_json, TestApp};

/// Test basic health check endpoint
#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new().await;

    let response = app.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "healthy");
}

/// Test liveness probe endpoint
#[tokio::test]
async fn test_liveness_probe_returns_ok() {
    let app = TestApp::new().await;

    let response = app.get("/health/live", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "alive");
}

/// Test readiness probe on the in-memory backend
#[tokio::test]
async fn test_readiness_probe_reports_checks() {
    let app = TestApp::new().await;

    let response = app.get("/health/ready", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["message"], "in-memory storage");
    assert_eq!(body["checks"]["notifications"]["channel"], "log");
    assert_eq!(body["checks"]["notifications"]["recipients"], 1);
}

/// Test the Prometheus endpoint exposes request counters
#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestApp::new().await;
    app.get("/health", None).await;

    let response = app.get("/metrics", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("tour_booking_http_requests_total"));
}
