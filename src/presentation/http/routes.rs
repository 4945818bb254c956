//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::auth_middleware;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to gather metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                String::from("failed to gather metrics"),
            )
        }
    }
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/tours", tour_routes(state.clone()))
        .nest("/requests", request_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::auth::me))
        // Layer applies to the routes declared above it
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
}

/// Tour routes (reads are public, writes require an administrator)
fn tour_routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(handlers::tour::create_tour))
        .route(
            "/{tour_id}",
            put(handlers::tour::update_tour).delete(handlers::tour::delete_tour),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    let public = Router::new()
        .route("/", get(handlers::tour::list_tours))
        .route("/popular", get(handlers::tour::popular_tours))
        .route("/hot", get(handlers::tour::hot_tours))
        .route("/{tour_id}", get(handlers::tour::get_tour));

    public.merge(admin)
}

/// Travel request routes (guest submission is public)
fn request_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handlers::travel_request::create_request)
                .get(handlers::travel_request::list_requests),
        )
        .route("/my", get(handlers::travel_request::my_requests))
        .route("/{request_id}", get(handlers::travel_request::get_request))
        .route(
            "/{request_id}/status",
            put(handlers::travel_request::update_status),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        .route(
            "/guest",
            post(handlers::travel_request::create_guest_request),
        )
}
