//! Cache Client Module
//!
//! Operations façade over a key-value backend. Apart from `connect`, no
//! operation here returns an error: backend failures are logged and turned
//! into a miss, `false` or an unknown TTL, so a store outage degrades the
//! service to always recomputing.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cache::backend::{BackendError, BackendResult, KvBackend, RawTtl};
use crate::cache::codec::{self, Storable};
use crate::cache::{MemoryBackend, RedisBackend, ServerInfo};
use crate::config::{CacheBackendKind, Config};
use crate::error::{Result, ServiceError};

// == Key TTL ==
/// Remaining lifetime of a key as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key expires after this duration
    Expires(Duration),
    /// The key exists without an expiry
    Persistent,
    /// The key does not exist
    Missing,
    /// The store could not be asked
    Unknown,
}

impl KeyTtl {
    /// Remaining whole seconds, when the key has an expiry.
    pub fn as_secs(&self) -> Option<u64> {
        match self {
            KeyTtl::Expires(remaining) => Some(remaining.as_secs()),
            _ => None,
        }
    }
}

impl From<RawTtl> for KeyTtl {
    fn from(raw: RawTtl) -> Self {
        match raw {
            RawTtl::Seconds(secs) => KeyTtl::Expires(Duration::from_secs(secs)),
            RawTtl::NoExpiry => KeyTtl::Persistent,
            RawTtl::Missing => KeyTtl::Missing,
        }
    }
}

// == Cache Health ==
/// Result of a cache health check.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CacheHealth {
    Healthy {
        backend: String,
        #[serde(flatten)]
        server: ServerInfo,
        hit_rate: f64,
    },
    Unhealthy {
        backend: String,
        error: String,
    },
}

impl CacheHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, CacheHealth::Healthy { .. })
    }
}

// == Cache Client ==
/// Shared handle to the cache store. Cloning shares the same connection.
#[derive(Clone)]
pub struct CacheClient {
    backend: Arc<dyn KvBackend>,
    default_ttl: Duration,
    op_timeout: Duration,
    closed: Arc<AtomicBool>,
}

impl CacheClient {
    // == Connect ==
    /// Connects to the configured backend.
    ///
    /// This is the only operation whose failure is surfaced: a store that
    /// cannot be reached at startup yields `ServiceError::CacheUnavailable`.
    pub async fn connect(config: &Config) -> Result<Self> {
        let backend: Arc<dyn KvBackend> = match config.cache_backend {
            CacheBackendKind::Redis => {
                let backend = RedisBackend::connect(config).await.map_err(|e| {
                    error!(error = %e, "Failed to connect to Redis");
                    ServiceError::CacheUnavailable(format!("Redis connection failed: {}", e))
                })?;
                Arc::new(backend)
            }
            CacheBackendKind::Memory => {
                warn!("Using in-process cache backend; entries are lost on restart");
                Arc::new(MemoryBackend::new())
            }
        };

        Ok(Self::with_backend(
            backend,
            config.default_ttl(),
            config.socket_timeout(),
        ))
    }

    /// Wraps an already connected backend.
    pub fn with_backend(backend: Arc<dyn KvBackend>, default_ttl: Duration, op_timeout: Duration) -> Self {
        Self {
            backend,
            default_ttl,
            op_timeout,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Get ==
    /// Returns the decoded value, or None on a miss or any failure.
    pub async fn get<T: Storable>(&self, key: &str) -> Option<T> {
        let bytes = match self.run("get", self.backend.get(key)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Cache get failed, treating as miss");
                return None;
            }
        };

        match codec::decode(bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(key, error = %e, "Failed to decode cached value, treating as miss");
                None
            }
        }
    }

    // == Set ==
    /// Encodes and stores `value` with `ttl` (or the default TTL).
    ///
    /// Returns whether the store acknowledged the write.
    pub async fn set<T: Storable>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let bytes = match codec::encode_to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(key, error = %e, "Failed to encode value for cache");
                return false;
            }
        };

        // SETEX rejects a zero TTL
        let ttl_secs = ttl.unwrap_or(self.default_ttl).as_secs().max(1);

        match self.run("set", self.backend.set_ex(key, bytes, ttl_secs)).await {
            Ok(acknowledged) => {
                debug!(key, ttl_secs, acknowledged, "Cache set");
                acknowledged
            }
            Err(e) => {
                warn!(key, error = %e, "Cache set failed");
                false
            }
        }
    }

    // == Delete ==
    /// Removes `key`; returns whether a key was removed.
    pub async fn delete(&self, key: &str) -> bool {
        match self.run("delete", self.backend.del(key)).await {
            Ok(removed) => removed > 0,
            Err(e) => {
                warn!(key, error = %e, "Cache delete failed");
                false
            }
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.run("exists", self.backend.exists(key)).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(key, error = %e, "Cache exists check failed");
                false
            }
        }
    }

    // == TTL ==
    pub async fn ttl(&self, key: &str) -> KeyTtl {
        match self.run("ttl", self.backend.ttl(key)).await {
            Ok(raw) => raw.into(),
            Err(e) => {
                warn!(key, error = %e, "Cache ttl lookup failed");
                KeyTtl::Unknown
            }
        }
    }

    // == Flush ==
    /// Clears every entry in the cache database.
    pub async fn flush_all(&self) -> bool {
        match self.run("flush", self.backend.flush_db()).await {
            Ok(()) => {
                info!("Cache flushed");
                true
            }
            Err(e) => {
                warn!(error = %e, "Cache flush failed");
                false
            }
        }
    }

    // == Health Check ==
    /// Queries server diagnostics; any failure reports `unhealthy`.
    pub async fn health_check(&self) -> CacheHealth {
        let backend = self.backend.name().to_string();

        match self.run("info", self.backend.info()).await {
            Ok(server) => {
                let hit_rate = server.hit_rate();
                CacheHealth::Healthy {
                    backend,
                    server,
                    hit_rate,
                }
            }
            Err(e) => {
                warn!(error = %e, "Cache health check failed");
                CacheHealth::Unhealthy {
                    backend,
                    error: e.to_string(),
                }
            }
        }
    }

    // == Close ==
    /// Stops issuing commands; later operations behave as if the store were down.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(backend = self.backend.name(), "Cache client closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Runs one backend command under the operation timeout.
    async fn run<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = BackendResult<T>>,
    ) -> BackendResult<T> {
        if self.is_closed() {
            return Err(BackendError::Unavailable(format!("{} on closed client", op)));
        }

        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| BackendError::Timeout)?
    }
}
