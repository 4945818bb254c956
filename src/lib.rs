//! # Tour Booking Library
//!
//! This crate provides a travel tour booking service with:
//! - RESTful HTTP API endpoints for tours, accounts and travel requests
//! - An administrator workflow for request statuses with race-safe
//!   tour capacity accounting
//! - Best-effort Telegram notifications to administrators
//! - PostgreSQL or in-memory storage
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core business entities, events and repository traits
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: Database, notification and metrics implementations
//! - **Presentation Layer**: HTTP handlers and middleware
//!
//! ## Module Structure
//!
//! ```text
//! tour_booking/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, events, and transition rules
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Repositories, notifications and metrics
//! +-- presentation/   HTTP routes, handlers and middleware
//! +-- shared/         Common utilities (errors, snowflake IDs)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
