//! # Tour Booking Server
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Storage (PostgreSQL pool or in-memory store)
//! - Administrator notification worker
//! - HTTP server

use anyhow::Result;
use tracing::info;

use tour_booking::config::Settings;
use tour_booking::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    tour_booking::telemetry::init_tracing();

    info!("Starting Tour Booking Server...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        storage = ?settings.storage.backend,
        admin_recipients = settings.telegram.admin_chat_ids.len(),
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    info!("Server stopped");
    Ok(())
}
