//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which key-value store sits behind the cache client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    /// Remote Redis server
    Redis,
    /// In-process store, for local runs without a Redis server
    Memory,
}

impl FromStr for CacheBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Service name reported in logs
    pub app_name: String,
    /// Version reported by the health endpoint
    pub app_version: String,
    /// HTTP bind address
    pub server_host: String,
    /// HTTP server port
    pub server_port: u16,
    /// Prefix for every API route
    pub api_prefix: String,
    /// Cache backend selection
    pub cache_backend: CacheBackendKind,
    /// Redis host
    pub redis_host: String,
    /// Redis port
    pub redis_port: u16,
    /// Redis database index
    pub redis_db: i64,
    /// Redis password, if the server requires one
    pub redis_password: Option<String>,
    /// Default TTL in seconds for stored predictions
    pub default_ttl: u64,
    /// Prefix of every derived cache key
    pub cache_key_prefix: String,
    /// Upper bound for a single store operation in seconds
    pub socket_timeout: u64,
    /// Upper bound for the initial store connection in seconds
    pub connect_timeout: u64,
    /// Path of the serialized model
    pub model_path: PathBuf,
    /// Path of the serialized text vectorizer, if the model consumes raw text
    pub vectorizer_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `APP_NAME` - Service name (default: MicroML)
    /// - `APP_VERSION` - Reported version (default: crate version)
    /// - `SERVER_HOST` / `SERVER_PORT` - Bind address (default: 0.0.0.0:8000)
    /// - `API_PREFIX` - Route prefix (default: /api)
    /// - `CACHE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `REDIS_HOST` / `REDIS_PORT` / `REDIS_DB` / `REDIS_PASSWORD`
    /// - `REDIS_TTL` - Default TTL in seconds (default: 3000)
    /// - `CACHE_KEY_PREFIX` - Cache key prefix (default: ml_pred)
    /// - `SOCKET_TIMEOUT` / `CONNECT_TIMEOUT` - Store timeouts in seconds (default: 5)
    /// - `MODEL_PATH` - Model artifact (default: artifacts/model.json)
    /// - `VECTORIZER_PATH` - Vectorizer artifact, empty to disable
    ///   (default: artifacts/vectorizer.json)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            app_name: env::var("APP_NAME").unwrap_or(defaults.app_name),
            app_version: env::var("APP_VERSION").unwrap_or(defaults.app_version),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_env("SERVER_PORT", defaults.server_port),
            api_prefix: env::var("API_PREFIX").unwrap_or(defaults.api_prefix),
            cache_backend: parse_env("CACHE_BACKEND", defaults.cache_backend),
            redis_host: env::var("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_port: parse_env("REDIS_PORT", defaults.redis_port),
            redis_db: parse_env("REDIS_DB", defaults.redis_db),
            redis_password: env::var("REDIS_PASSWORD")
                .ok()
                .filter(|v| !v.is_empty()),
            default_ttl: parse_env("REDIS_TTL", defaults.default_ttl),
            cache_key_prefix: env::var("CACHE_KEY_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_key_prefix),
            socket_timeout: parse_env("SOCKET_TIMEOUT", defaults.socket_timeout),
            connect_timeout: parse_env("CONNECT_TIMEOUT", defaults.connect_timeout),
            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            vectorizer_path: match env::var("VECTORIZER_PATH") {
                Ok(v) if v.is_empty() => None,
                Ok(v) => Some(PathBuf::from(v)),
                Err(_) => defaults.vectorizer_path,
            },
        }
    }

    /// Default TTL applied to stored predictions.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Per-operation timeout for the cache store.
    pub fn socket_timeout(&self) -> Duration {
        Duration::from_secs(self.socket_timeout)
    }

    /// Timeout for establishing the store connection.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "MicroML".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            api_prefix: "/api".to_string(),
            cache_backend: CacheBackendKind::Redis,
            redis_host: "localhost".to_string(),
            redis_port: 6379,
            redis_db: 0,
            redis_password: None,
            default_ttl: 3000,
            cache_key_prefix: crate::cache::DEFAULT_KEY_PREFIX.to_string(),
            socket_timeout: 5,
            connect_timeout: 5,
            model_path: PathBuf::from("artifacts/model.json"),
            vectorizer_path: Some(PathBuf::from("artifacts/vectorizer.json")),
        }
    }
}

/// Reads and parses an environment variable, falling back to `default`
/// when it is unset or unparsable.
fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
