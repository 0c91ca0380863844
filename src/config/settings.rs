//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Which persistence backend to wire
    pub storage: StorageSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Outbound event fan-out through Redis pub/sub
    pub notifications: NotificationSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Session and sequencing tunables
    pub realtime: RealtimeSettings,

    /// Input limits enforced by the application services
    pub limits: LimitSettings,

    /// Log output settings
    pub logging: LoggingSettings,

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

/// Persistence backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

/// Redis pub/sub mirror of outbound events.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    pub enabled: bool,

    /// Redis connection URL
    #[serde(default)]
    pub redis_url: String,

    /// Channel name prefix; the routing key is appended
    pub channel_prefix: String,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins; `"*"` opens the API to any origin
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds
    pub max_age_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeSettings {
    /// Idle period after which a conversation's sequence slot is evicted
    pub sequencer_idle_secs: u64,

    /// Upper bound on live conversation slots kept by the sequencer
    pub sequencer_max_keys: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitSettings {
    /// Maximum message length in characters
    pub max_message_length: usize,

    /// Maximum username / full name length in characters
    pub max_name_length: usize,

    /// Largest accepted font size in user settings
    pub max_font_size: u32,

    /// Messages returned per conversation page
    pub page_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub format: LogFormat,
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
    /// or if a selected backend is missing its connection URL.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Self::defaults(&environment)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("notifications.redis_url", std::env::var("REDIS_URL").ok())?
            .build()?
            .try_deserialize()
            .and_then(Self::validated)
    }

    /// Settings built purely from defaults with the in-memory backend.
    ///
    /// Used by tests and local tooling that must not touch the filesystem
    /// or the process environment.
    pub fn in_memory() -> Result<Self, ConfigError> {
        Self::defaults("test")?
            .set_override("storage.backend", "memory")?
            .build()?
            .try_deserialize()
            .and_then(Self::validated)
    }

    fn defaults(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("storage.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("notifications.enabled", false)?
            .set_default("notifications.channel_prefix", "messenger")?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .set_default("cors.max_age_secs", 3600)?
            .set_default("realtime.sequencer_idle_secs", 60)?
            .set_default("realtime.sequencer_max_keys", 100_000_i64)?
            .set_default("limits.max_message_length", 2000)?
            .set_default("limits.max_name_length", 50)?
            .set_default("limits.max_font_size", 200)?
            .set_default("limits.page_size", 250)?
            .set_default("logging.format", "pretty")
    }

    fn validated(settings: Self) -> Result<Self, ConfigError> {
        if settings.storage.backend == StorageBackend::Postgres
            && settings.database.url.trim().is_empty()
        {
            return Err(ConfigError::Message(
                "database.url (or DATABASE_URL) is required for the postgres backend".into(),
            ));
        }
        if settings.notifications.enabled && settings.notifications.redis_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "notifications.redis_url (or REDIS_URL) is required when notifications are enabled"
                    .into(),
            ));
        }
        if settings.limits.page_size == 0 {
            return Err(ConfigError::Message("limits.page_size must be positive".into()));
        }
        Ok(settings)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl RealtimeSettings {
    pub fn sequencer_idle(&self) -> Duration {
        Duration::from_secs(self.sequencer_idle_secs)
    }
}
