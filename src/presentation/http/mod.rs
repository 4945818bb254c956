//! HTTP API
//!
//! JSON endpoints under `/api/v1`, plus health and metrics.

pub mod extractors;
pub mod handlers;
pub mod routes;
