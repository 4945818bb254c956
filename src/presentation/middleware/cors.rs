//! CORS Middleware Configuration

use std::time::Duration;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::CorsSettings;

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Origins from settings that parse as header values; malformed ones are skipped.
fn parse_origins(settings: &CorsSettings) -> Vec<HeaderValue> {
    settings
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect()
}

/// Create CORS layer from settings; no configured origins means any origin.
pub fn create_cors_layer(settings: &CorsSettings) -> CorsLayer {
    let origins = parse_origins(settings);

    let layer = CorsLayer::new()
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
