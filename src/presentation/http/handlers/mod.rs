//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod auth;
pub mod health;
pub mod tour;
pub mod travel_request;
