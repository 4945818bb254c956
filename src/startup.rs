//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{middleware, Router};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::application::services::{AuthService, AuthServiceImpl};
use crate::config::{Settings, StorageBackend};
use crate::domain::{EventPublisher, TourRepository, TravelRequestRepository, UserRepository};
use crate::infrastructure::database;
use crate::infrastructure::notifications::{
    spawn_dispatcher, LogNotifier, NotificationDispatcher, Notifier, TelegramNotifier,
};
use crate::infrastructure::repositories::{
    MemoryStore, PgTourRepository, PgTravelRequestRepository, PgUserRepository,
};
use crate::presentation::http::{handlers::health, routes};
use crate::presentation::middleware::{cors, logging};
use crate::shared::snowflake::SnowflakeGenerator;

/// How long shutdown waits for queued notifications to go out
const NOTIFICATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub tours: Arc<dyn TourRepository>,
    pub requests: Arc<dyn TravelRequestRepository>,
    pub notifications: Arc<dyn EventPublisher>,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub settings: Arc<Settings>,
    /// Connection pool when running on PostgreSQL, for readiness checks
    pub db: Option<PgPool>,
}

impl AppState {
    /// State backed by a fresh in-memory store.
    pub fn in_memory(settings: Settings, notifications: Arc<dyn EventPublisher>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            tours: store.clone(),
            requests: store,
            notifications,
            snowflake: Arc::new(snowflake_generator(&settings)),
            settings: Arc::new(settings),
            db: None,
        }
    }

    /// State backed by PostgreSQL repositories sharing `pool`.
    pub fn postgres(
        settings: Settings,
        pool: PgPool,
        notifications: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tours: Arc::new(PgTourRepository::new(pool.clone())),
            requests: Arc::new(PgTravelRequestRepository::new(pool.clone())),
            notifications,
            snowflake: Arc::new(snowflake_generator(&settings)),
            settings: Arc::new(settings),
            db: Some(pool),
        }
    }
}

fn snowflake_generator(settings: &Settings) -> SnowflakeGenerator {
    SnowflakeGenerator::new(
        u64::from(settings.snowflake.machine_id),
        settings.snowflake.epoch,
    )
}

/// Router with every middleware layer applied.
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);
    routes::create_router(state)
        .layer(middleware::from_fn(logging::track_metrics))
        .layer(logging::create_trace_layer())
        .layer(cors)
}

/// Create the administrator account from settings when it does not exist yet.
pub async fn bootstrap_admin(state: &AppState) -> Result<()> {
    let auth = AuthServiceImpl::new(
        state.users.clone(),
        state.snowflake.clone(),
        state.settings.jwt.clone(),
    );
    auth.ensure_admin(&state.settings.admin)
        .await
        .context("Failed to create administrator account")?;
    Ok(())
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    notification_worker: JoinHandle<()>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        // Start the notification worker
        let notifier: Arc<dyn Notifier> = match &settings.telegram.bot_token {
            Some(token) => {
                tracing::info!("Telegram notifications enabled");
                Arc::new(TelegramNotifier::new(token.clone()))
            }
            None => {
                tracing::warn!("TELEGRAM_BOT_TOKEN not set, notifications will only be logged");
                Arc::new(LogNotifier)
            }
        };
        if settings.telegram.admin_chat_ids.is_empty() {
            tracing::warn!("No administrator chat ids configured, notifications have no recipients");
        }
        let dispatcher = NotificationDispatcher::new(
            notifier,
            settings.telegram.admin_chat_ids.clone(),
            settings.telegram.send_timeout(),
        );
        let (handle, notification_worker) =
            spawn_dispatcher(dispatcher, settings.telegram.queue_capacity);
        let notifications: Arc<dyn EventPublisher> = Arc::new(handle);

        // Select storage
        let state = match settings.storage.backend {
            StorageBackend::Postgres => {
                let pool = database::create_pool(&settings.database)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                tracing::info!("Database connection pool created");

                if settings.database.run_migrations {
                    database::run_migrations(&pool)
                        .await
                        .context("Failed to run database migrations")?;
                    tracing::info!("Database migrations applied");
                }
                AppState::postgres(settings.clone(), pool, notifications)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage, data is lost on restart");
                AppState::in_memory(settings.clone(), notifications)
            }
        };

        bootstrap_admin(&state).await?;

        let router = build_router(state);

        // Bind to address
        let addr = settings.server_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            notification_worker,
        })
    }

    /// Run the server until a shutdown signal, then drain queued notifications
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // The router, and with it every queue handle, is gone; the worker
        // finishes what is queued and exits.
        match tokio::time::timeout(NOTIFICATION_DRAIN_TIMEOUT, self.notification_worker).await {
            Ok(Ok(())) => tracing::info!("Notification queue drained"),
            Ok(Err(e)) => tracing::error!(error = %e, "Notification worker failed"),
            Err(_) => tracing::warn!("Gave up waiting for pending notifications"),
        }
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
