/// Configuration management for civic-feed-service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Storage backend selection
    pub storage: StorageConfig,
    /// Database configuration, present for the postgres backend
    pub database: Option<DatabaseConfig>,
    /// Feed paging limits
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        matches!(self.env.as_str(), "production" | "prod")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("unsupported STORAGE_BACKEND '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Tenants registered at startup by the memory backend
    pub memory_tenants: Vec<Uuid>,
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Apply embedded migrations at startup
    #[serde(default)]
    pub run_migrations: bool,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Page size when the request has no `limit`
    pub default_page_size: u32,
    /// Requests asking for more are clamped to this
    pub max_page_size: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env_or("PORT", 8090),
        };

        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => StorageBackend::parse(&value)?,
            Err(_) => StorageBackend::Postgres,
        };
        if backend == StorageBackend::Memory && app.is_production() {
            bail!("STORAGE_BACKEND=memory is not allowed when APP_ENV is production");
        }

        let memory_tenants = match std::env::var("MEMORY_TENANTS") {
            Ok(raw) => parse_tenant_list(&raw)?,
            Err(_) => Vec::new(),
        };

        let database = match backend {
            StorageBackend::Postgres => Some(DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .context("DATABASE_URL environment variable not set")?,
                max_connections: env_or("DB_MAX_CONNECTIONS", default_max_connections()),
                min_connections: env_or("DB_MIN_CONNECTIONS", default_min_connections()),
                acquire_timeout_secs: env_or(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    default_acquire_timeout_secs(),
                ),
                run_migrations: env_or("RUN_MIGRATIONS", false),
            }),
            StorageBackend::Memory => None,
        };

        let defaults = FeedConfig::default();
        let max_page_size = env_or("FEED_MAX_PAGE_SIZE", defaults.max_page_size).max(1);
        let feed = FeedConfig {
            max_page_size,
            default_page_size: env_or("FEED_DEFAULT_PAGE_SIZE", defaults.default_page_size)
                .clamp(1, max_page_size),
        };

        Ok(Config {
            app,
            storage: StorageConfig {
                backend,
                memory_tenants,
            },
            database,
            feed,
        })
    }
}

/// Comma-separated tenant ids; blanks are skipped
fn parse_tenant_list(raw: &str) -> Result<Vec<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .with_context(|| format!("invalid tenant id in MEMORY_TENANTS: {}", s))
        })
        .collect()
}
