//! REST API endpoint tests, one module per resource.

mod auth_tests;
mod health_tests;
mod request_tests;
mod tour_tests;
