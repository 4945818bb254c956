//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Request status transitions by outcome
//! - Administrator notification deliveries by outcome
//! - Notification queue depth

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "tour_booking";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Status transitions - "applied", "no_capacity", "conflict", "not_found", ...
pub static REQUEST_TRANSITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "request_transitions_total",
            "Travel request status transitions by outcome",
        )
        .namespace(NAMESPACE),
        &["to", "outcome"],
    )
    .expect("Failed to create REQUEST_TRANSITIONS_TOTAL metric")
});

/// Notification deliveries - "sent", "failed", "timeout", "dropped"
pub static NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "notifications_total",
            "Administrator notification deliveries by outcome",
        )
        .namespace(NAMESPACE),
        &["outcome"],
    )
    .expect("Failed to create NOTIFICATIONS_TOTAL metric")
});

/// Events waiting for the notification worker
pub static NOTIFICATION_QUEUE_DEPTH: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "notification_queue_depth",
            "Request events waiting for delivery",
        )
        .namespace(NAMESPACE),
    )
    .expect("Failed to create NOTIFICATION_QUEUE_DEPTH metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(REQUEST_TRANSITIONS_TOTAL.clone()))
        .expect("Failed to register REQUEST_TRANSITIONS_TOTAL");
    registry
        .register(Box::new(NOTIFICATIONS_TOTAL.clone()))
        .expect("Failed to register NOTIFICATIONS_TOTAL");
    registry
        .register(Box::new(NOTIFICATION_QUEUE_DEPTH.clone()))
        .expect("Failed to register NOTIFICATION_QUEUE_DEPTH");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {e}"))?;
    String::from_utf8(buffer).map_err(|e| format!("Metrics are not valid UTF-8: {e}"))
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to record the outcome of a status transition
pub fn record_transition(to: &str, outcome: &str) {
    REQUEST_TRANSITIONS_TOTAL
        .with_label_values(&[to, outcome])
        .inc();
}

/// Helper to record a single notification delivery attempt
pub fn record_notification(outcome: &str) {
    NOTIFICATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn notification_queued() {
    NOTIFICATION_QUEUE_DEPTH.inc();
}

pub fn notification_dequeued() {
    NOTIFICATION_QUEUE_DEPTH.dec();
}
