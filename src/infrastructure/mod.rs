//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database repositories (PostgreSQL) and the in-memory store
//! - Administrator notifications (Telegram)
//! - Prometheus metrics

pub mod database;
pub mod metrics;
pub mod notifications;
pub mod repositories;
