//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
///
/// Loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Which storage backend serves the repositories
    pub storage: StorageSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// JWT authentication settings
    pub jwt: JwtSettings,

    /// Snowflake ID generator settings
    pub snowflake: SnowflakeSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Administrator notifications over Telegram
    pub telegram: TelegramSettings,

    /// Administrator account created at startup when missing
    pub admin: AdminSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// Repository backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process-local store, lost on restart
    Memory,
}

/// Storage selection.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens
    pub secret: String,

    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-1023)
    pub machine_id: u16,

    /// Custom epoch timestamp in milliseconds
    pub epoch: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (empty allows any)
    pub allowed_origins: Vec<String>,
}

/// Telegram notification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSettings {
    /// Bot API token; notifications are only logged when unset
    pub bot_token: Option<String>,

    /// Chat ids of the administrators that receive request events
    pub admin_chat_ids: Vec<i64>,

    /// Upper bound for a single delivery attempt, in seconds
    pub send_timeout_secs: u64,

    /// Events buffered for the delivery worker before new ones are dropped
    pub queue_capacity: usize,
}

impl TelegramSettings {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

/// Bootstrap administrator account.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSettings {
    pub username: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Minimum required length for JWT secret (256 bits = 32 bytes)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Parse a comma-separated list of Telegram chat ids, e.g. `"123, -100456"`.
pub fn parse_chat_ids(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| ConfigError::Message(format!("Invalid Telegram chat id: {s:?}")))
        })
        .collect()
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. built-in defaults
    /// 2. config/default.toml (base configuration)
    /// 3. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 4. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// if the JWT secret is too short, or if an admin chat id is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let admin_chat_ids = std::env::var("TELEGRAM_ADMIN_IDS")
            .ok()
            .map(|raw| parse_chat_ids(&raw))
            .transpose()?;

        Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("storage.backend", "postgres")?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("jwt.access_token_expiry_minutes", 30)?
            .set_default("snowflake.machine_id", 1)?
            .set_default("snowflake.epoch", crate::shared::snowflake::DEFAULT_EPOCH)?
            .set_default("cors.allowed_origins", Vec::<String>::new())?
            .set_default("telegram.admin_chat_ids", Vec::<i64>::new())?
            .set_default("telegram.send_timeout_secs", 10)?
            .set_default("telegram.queue_capacity", 256)?
            .set_default("admin.username", "admin")?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Load from environment variables
            // APP__SERVER__PORT=8000 -> server.port = 8000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("storage.backend", std::env::var("STORAGE_BACKEND").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option(
                "telegram.bot_token",
                std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            )?
            .set_override_option("telegram.admin_chat_ids", admin_chat_ids)?
            .set_override_option("admin.username", std::env::var("ADMIN_USERNAME").ok())?
            .set_override_option("admin.email", std::env::var("ADMIN_EMAIL").ok())?
            .set_override_option("admin.password", std::env::var("ADMIN_PASSWORD").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| settings.validate().map(|()| settings))
    }

    /// Check cross-field constraints that deserialization cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate JWT secret length
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "JWT secret must be at least {} characters. Current length: {}",
                MIN_JWT_SECRET_LENGTH,
                self.jwt.secret.len()
            )));
        }
        if self.storage.backend == StorageBackend::Postgres && self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "database.url (DATABASE_URL) is required for the postgres backend".into(),
            ));
        }
        if self.telegram.queue_capacity == 0 {
            return Err(ConfigError::Message(
                "telegram.queue_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
