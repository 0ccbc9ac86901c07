//! Centralized configuration management for polyport
//!
//! Provides a unified configuration system with type-safe, validated
//! configuration loaded from safe defaults plus environment overrides:
//! 1. Safe defaults (defined as constants)
//! 2. Environment variable overrides
//! 3. Runtime validation

pub mod error;

pub use error::{ConfigError, ConfigResult};

use std::path::PathBuf;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

// =============================================================================
// SAFE DEFAULTS - Work for any environment (dev, staging, prod, test)
// =============================================================================

// Polygon API Configuration
const DEFAULT_POLYGON_API_URL: &str = "https://polygon.codeforces.com/api/";

// Judge Configuration
const DEFAULT_JUDGE_DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_JUDGE_PROBLEM_DATA_ROOT: &str = "/var/judge/problems";
const DEFAULT_JUDGE_MEDIA_ROOT: &str = "/var/judge/media";
const DEFAULT_JUDGE_MEDIA_URL: &str = "/media/";

// Pandoc Configuration
const DEFAULT_PANDOC_BIN: &str = "pandoc";

// Database Configuration (safe local defaults)
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_NAME: &str = "polyport";
const DEFAULT_DB_USER: &str = "polyport";
const DEFAULT_DB_PASSWORD: &str = "localdev123";
const DEFAULT_DB_SSL_MODE: &str = "disable";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_DB_MIN_CONNECTIONS: u32 = 2;
const DEFAULT_DB_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_DB_IDLE_TIMEOUT_SECONDS: u64 = 300;
const DEFAULT_AUTO_MIGRATE: bool = true;

// API Server Configuration
const DEFAULT_API_HOST: &str = "127.0.0.1";
const DEFAULT_API_PORT: u16 = 3000;

// Import Worker Configuration
const DEFAULT_WORKER_QUEUE_CAPACITY: usize = 64;
const DEFAULT_WORKER_CONCURRENCY: usize = 2;

/// Core configuration for the entire polyport application
///
/// All settings have safe defaults and can be overridden via environment
/// variables. Secrets (the Polygon key pair) have no defaults and must be
/// provided before `validate()` passes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApplicationConfig {
    /// Polygon REST API access
    pub polygon: PolygonConfig,

    /// Host judge integration points
    pub judge: JudgeConfig,

    /// External LaTeX-to-Markdown converter
    pub pandoc: PandocConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// API server configuration
    pub api: ApiConfig,

    /// Import worker configuration
    pub worker: WorkerConfig,
}

impl ApplicationConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self {
            polygon: PolygonConfig::from_env(),
            judge: JudgeConfig::from_env(),
            pandoc: PandocConfig::from_env(),
            database: DatabaseConfig::from_env(),
            api: ApiConfig::from_env(),
            worker: WorkerConfig::from_env(),
        }
    }

    /// Validate the whole configuration tree
    pub fn validate(&self) -> ConfigResult<()> {
        self.polygon.validate()?;
        self.judge.validate()?;
        self.database.validate()?;
        self.worker.validate()?;
        Ok(())
    }
}

/// Credentials and endpoint for the Polygon REST API
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PolygonConfig {
    /// Base URL, always with a trailing slash
    pub api_url: String,

    /// API key, sent with every request
    pub api_key: String,

    /// API secret, used only for request signing
    pub api_secret: String,

    /// Polygon account name, used in error messages shown to importers
    pub user: String,
}

impl PolygonConfig {
    pub fn from_env() -> Self {
        let mut api_url = std::env::var("POLYGON_API_URL")
            .unwrap_or_else(|_| DEFAULT_POLYGON_API_URL.to_string());
        if !api_url.ends_with('/') {
            api_url.push('/');
        }

        Self {
            api_url,
            api_key: std::env::var("POLYGON_API_KEY").unwrap_or_default(),
            api_secret: std::env::var("POLYGON_API_SECRET").unwrap_or_default(),
            user: std::env::var("POLYGON_USER").unwrap_or_default(),
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "POLYGON_API_KEY".to_string(),
            });
        }
        if self.api_secret.is_empty() {
            return Err(ConfigError::MissingField {
                field: "POLYGON_API_SECRET".to_string(),
            });
        }
        Ok(())
    }
}

/// Filesystem roots and limits of the host judge
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JudgeConfig {
    /// Site default language code; selects the main statement
    pub default_language: String,

    /// Directory holding per-problem data directories
    pub problem_data_root: PathBuf,

    /// Media storage root (statement images live below it)
    pub media_root: PathBuf,

    /// Public URL prefix the media root is served from
    pub media_url: String,

    /// Lower clamp for imported memory limits, in KB
    pub min_memory_limit: Option<u64>,

    /// Upper clamp for imported memory limits, in KB
    pub max_memory_limit: Option<u64>,
}

impl JudgeConfig {
    pub fn from_env() -> Self {
        let mut media_url = std::env::var("JUDGE_MEDIA_URL")
            .unwrap_or_else(|_| DEFAULT_JUDGE_MEDIA_URL.to_string());
        if !media_url.ends_with('/') {
            media_url.push('/');
        }

        Self {
            default_language: std::env::var("JUDGE_DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| DEFAULT_JUDGE_DEFAULT_LANGUAGE.to_string()),
            problem_data_root: std::env::var("JUDGE_PROBLEM_DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_JUDGE_PROBLEM_DATA_ROOT)),
            media_root: std::env::var("JUDGE_MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_JUDGE_MEDIA_ROOT)),
            media_url,
            min_memory_limit: std::env::var("JUDGE_MIN_MEMORY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok()),
            max_memory_limit: std::env::var("JUDGE_MAX_MEMORY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if let (Some(min), Some(max)) = (self.min_memory_limit, self.max_memory_limit) {
            if min > max {
                return Err(ConfigError::OutOfRange {
                    field: "JUDGE_MIN_MEMORY_LIMIT".to_string(),
                    value: min,
                    min: 0,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Location of the pandoc binary
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PandocConfig {
    /// Binary name or absolute path
    pub binary: PathBuf,
}

impl PandocConfig {
    pub fn from_env() -> Self {
        Self {
            binary: std::env::var("PANDOC_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_PANDOC_BIN)),
        }
    }
}

/// `PostgreSQL` connection settings
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DatabaseConfig {
    /// Database host
    pub host: String,

    /// Database port
    pub port: u16,

    /// Database name
    pub database: String,

    /// Username for authentication
    pub username: String,

    /// Password for authentication (use environment variables for security)
    pub password: String,

    /// SSL mode for connections ("disable", "prefer", "require")
    pub ssl_mode: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Minimum number of connections in pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub timeout_seconds: u64,

    /// Idle timeout in seconds
    pub idle_timeout_seconds: u64,

    /// Enable migrations on startup
    pub auto_migrate: bool,
}

impl DatabaseConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let host = std::env::var("DB_HOST").unwrap_or_else(|_| DEFAULT_DB_HOST.to_string());

        let port = std::env::var("DB_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_PORT);

        let database = std::env::var("DB_NAME").unwrap_or_else(|_| DEFAULT_DB_NAME.to_string());

        let username = std::env::var("DB_USER").unwrap_or_else(|_| DEFAULT_DB_USER.to_string());

        let password = std::env::var("DB_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!(
                "Using default database password - set DB_PASSWORD. \
                 NEVER use the default password in production!"
            );
            DEFAULT_DB_PASSWORD.to_string()
        });

        let ssl_mode =
            std::env::var("DB_SSLMODE").unwrap_or_else(|_| DEFAULT_DB_SSL_MODE.to_string());

        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

        let min_connections = std::env::var("DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_MIN_CONNECTIONS);

        let timeout_seconds = std::env::var("DB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_TIMEOUT_SECONDS);

        let idle_timeout_seconds = std::env::var("DB_IDLE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_IDLE_TIMEOUT_SECONDS);

        let auto_migrate = std::env::var("DB_AUTO_MIGRATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_AUTO_MIGRATE);

        Self {
            host,
            port,
            database,
            username,
            password,
            ssl_mode,
            max_connections,
            min_connections,
            timeout_seconds,
            idle_timeout_seconds,
            auto_migrate,
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.database.is_empty() {
            return Err(ConfigError::MissingField {
                field: "DB_NAME".to_string(),
            });
        }
        if self.max_connections == 0 || self.max_connections > 1000 {
            return Err(ConfigError::OutOfRange {
                field: "DB_MAX_CONNECTIONS".to_string(),
                value: u64::from(self.max_connections),
                min: 1,
                max: 1000,
            });
        }
        Ok(())
    }

    /// Convert string SSL mode to `PgSslMode`
    fn parse_ssl_mode(&self) -> PgSslMode {
        match self.ssl_mode.as_str() {
            "disable" => PgSslMode::Disable,
            "require" => PgSslMode::Require,
            _ => PgSslMode::Prefer,
        }
    }

    /// Build `PostgreSQL` connection options (no URL with password exposed!)
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
            .ssl_mode(self.parse_ssl_mode())
    }

    /// Create a `PostgreSQL` connection pool with proper configuration
    ///
    /// # Errors
    /// Returns an error if connection to database fails
    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.timeout_seconds))
            .idle_timeout(Duration::from_secs(self.idle_timeout_seconds))
            .connect_with(self.connect_options())
            .await
    }

    /// Get connection info for logging (NO PASSWORD!)
    pub fn safe_connection_string(&self) -> String {
        format!(
            "{}@{}:{}/{} (ssl: {})",
            self.username, self.host, self.port, self.database, self.ssl_mode
        )
    }
}

/// API server configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| DEFAULT_API_HOST.to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_API_PORT),
        }
    }
}

/// Import worker configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WorkerConfig {
    /// Dispatch queue capacity; submissions beyond it are rejected
    pub queue_capacity: usize,

    /// Number of concurrent import jobs
    pub concurrency: usize,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self {
            queue_capacity: std::env::var("WORKER_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_WORKER_QUEUE_CAPACITY),
            concurrency: std::env::var("WORKER_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_WORKER_CONCURRENCY),
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 {
            return Err(ConfigError::OutOfRange {
                field: "WORKER_CONCURRENCY".to_string(),
                value: 0,
                min: 1,
                max: 64,
            });
        }
        Ok(())
    }
}
