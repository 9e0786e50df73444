/// Configuration management for Post Service
///
/// Settings come from environment variables (a `.env` file is honoured in
/// development). Numeric values that fail to parse are errors, not defaults.
use redis_utils::RedisTarget;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use versioned_cache::{RetryConfig, DEFAULT_NAMESPACE};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Cache configuration
    pub cache: CacheConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Emit JSON logs
    pub json_logs: bool,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Connection acquisition timeout
    pub acquire_timeout_secs: u64,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis: RedisTarget,
    /// Key namespace shared by envelopes and counters
    pub namespace: String,
    /// Retries for invalidation bumps after a successful write
    pub bump_retries: u32,
    pub bump_backoff_ms: u64,
}

impl CacheConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.bump_retries,
            initial_backoff: Duration::from_millis(self.bump_backoff_ms),
            ..Default::default()
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let app = AppConfig {
            env: app_env,
            host: std::env::var("POST_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or_default("POST_SERVICE_PORT", 8080)?,
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/microblog".to_string()),
            max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: parse_env_or_default("DATABASE_ACQUIRE_TIMEOUT_SECS", 10)?,
        };

        let backend = match std::env::var("CACHE_BACKEND") {
            Ok(value) => parse_backend(&value)?,
            Err(_) => CacheBackend::Redis,
        };
        if app.is_production() && backend == CacheBackend::Memory {
            return Err(
                "CACHE_BACKEND=memory is process-local and cannot be used in production"
                    .to_string(),
            );
        }

        let cache = CacheConfig {
            backend,
            redis: parse_redis_target()?,
            namespace: std::env::var("CACHE_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            bump_retries: parse_env_or_default("CACHE_BUMP_RETRIES", 3)?,
            bump_backoff_ms: parse_env_or_default("CACHE_BUMP_BACKOFF_MS", 50)?,
        };

        Ok(Config {
            app,
            database,
            cache,
        })
    }
}

fn parse_backend(value: &str) -> Result<CacheBackend, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "redis" => Ok(CacheBackend::Redis),
        "memory" => Ok(CacheBackend::Memory),
        other => Err(format!(
            "CACHE_BACKEND must be 'redis' or 'memory', got '{}'",
            other
        )),
    }
}

/// `REDIS_URL` wins; otherwise `REDIS_ADDRESS` / `REDIS_PASSWORD` / `REDIS_DB`.
fn parse_redis_target() -> Result<RedisTarget, String> {
    if let Ok(url) = std::env::var("REDIS_URL") {
        return Ok(RedisTarget::Url(url));
    }

    match std::env::var("REDIS_ADDRESS") {
        Ok(address) => Ok(RedisTarget::Address {
            address,
            password: std::env::var("REDIS_PASSWORD").ok(),
            database: parse_env_or_default("REDIS_DB", 0)?,
        }),
        Err(_) => Ok(RedisTarget::Url("redis://localhost:6379".to_string())),
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
