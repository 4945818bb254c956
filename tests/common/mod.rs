//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure. Every test app runs on
//! its own in-memory store and records published events instead of sending
//! them anywhere.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use tour_booking::config::*;
use tour_booking::domain::{EventPublisher, RequestEvent};
use tour_booking::startup::{bootstrap_admin, build_router, AppState};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password-123";

/// Publisher that keeps every event for later assertions
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<RequestEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<RequestEvent> {
        self.events.lock().clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: RequestEvent) {
        self.events.lock().push(event);
    }
}

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        storage: StorageSettings {
            backend: StorageBackend::Memory,
        },
        database: DatabaseSettings {
            url: String::new(),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: 1,
            run_migrations: false,
        },
        jwt: JwtSettings {
            secret: "integration-test-secret-with-enough-length".into(),
            access_token_expiry_minutes: 30,
        },
        snowflake: SnowflakeSettings {
            machine_id: 1,
            epoch: 1_704_067_200_000,
        },
        cors: CorsSettings {
            allowed_origins: vec!["http://localhost:3000".into()],
        },
        telegram: TelegramSettings {
            bot_token: None,
            admin_chat_ids: vec![1001],
            send_timeout_secs: 1,
            queue_capacity: 16,
        },
        admin: AdminSettings {
            username: "admin".into(),
            email: Some(ADMIN_EMAIL.into()),
            password: Some(ADMIN_PASSWORD.into()),
        },
        environment: "test".into(),
    }
}

/// Test application builder
pub struct TestApp {
    pub router: Router,
    pub events: Arc<RecordingPublisher>,
}

impl TestApp {
    /// Create a new test application with a seeded administrator
    pub async fn new() -> Self {
        let events = Arc::new(RecordingPublisher::default());
        let state = AppState::in_memory(test_settings(), events.clone());
        bootstrap_admin(&state).await.unwrap();

        Self {
            router: build_router(state),
            events,
        }
    }

    /// Send a request with an optional JSON body and bearer token
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.request("GET", uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> Response {
        self.request("POST", uri, Some(body), token).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: Option<&str>) -> Response {
        self.request("PUT", uri, Some(body), token).await
    }

    /// Log in and return the access token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/v1/auth/login",
                json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Register a regular user and return the access token
    pub async fn register_user(&self, username: &str) -> String {
        let response = self
            .post(
                "/api/v1/auth/register",
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "traveller-pass",
                }),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Create a tour as the administrator and return its id
    pub async fn create_tour(&self, title: &str, max_participants: i32) -> String {
        let token = self.admin_token().await;
        let response = self
            .post("/api/v1/tours", tour_body(title, max_participants), Some(&token))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        body["id"].as_str().unwrap().to_string()
    }
}

pub fn tour_body(title: &str, max_participants: i32) -> Value {
    json!({
        "title": title,
        "description": "Five days on the river",
        "location": "Altai",
        "price": 45000.0,
        "duration": 5,
        "rating": 4.8,
        "max_participants": max_participants,
        "is_hot": false,
    })
}

/// Read a response body as JSON
pub async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
