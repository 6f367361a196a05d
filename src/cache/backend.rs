//! Backend Module
//!
//! The narrow command surface the cache client needs from a key-value store.

use async_trait::async_trait;
use thiserror::Error;

use crate::cache::ServerInfo;

// == Backend Error ==
/// Failure reported by a key-value store.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("operation timed out")]
    Timeout,

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// TTL reply for a single key, as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTtl {
    /// Seconds until expiry
    Seconds(u64),
    /// The key exists without an expiry
    NoExpiry,
    /// The key does not exist
    Missing,
}

impl RawTtl {
    /// Interprets a Redis `TTL` reply (`-2` missing, `-1` no expiry).
    pub fn from_reply(reply: i64) -> Self {
        match reply {
            -2 => RawTtl::Missing,
            n if n < 0 => RawTtl::NoExpiry,
            n => RawTtl::Seconds(n as u64),
        }
    }
}

// == Key-Value Backend ==
/// Operations the cache client issues against the store.
///
/// Values are opaque bytes; implementations do no encoding of their own.
#[async_trait]
pub trait KvBackend: Send + Sync + 'static {
    /// Short name for logs and health output.
    fn name(&self) -> &'static str;

    /// `PING`
    async fn ping(&self) -> BackendResult<()>;

    /// `GET key`
    async fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>>;

    /// `SETEX key ttl value`; returns whether the store acknowledged the write.
    async fn set_ex(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> BackendResult<bool>;

    /// `DEL key`; returns the number of removed keys.
    async fn del(&self, key: &str) -> BackendResult<u64>;

    /// `EXISTS key`
    async fn exists(&self, key: &str) -> BackendResult<bool>;

    /// `TTL key`
    async fn ttl(&self, key: &str) -> BackendResult<RawTtl>;

    /// `FLUSHDB`
    async fn flush_db(&self) -> BackendResult<()>;

    /// `INFO`
    async fn info(&self) -> BackendResult<ServerInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_reply_mapping() {
        assert_eq!(RawTtl::from_reply(-2), RawTtl::Missing);
        assert_eq!(RawTtl::from_reply(-1), RawTtl::NoExpiry);
        assert_eq!(RawTtl::from_reply(0), RawTtl::Seconds(0));
        assert_eq!(RawTtl::from_reply(2999), RawTtl::Seconds(2999));
    }
}
