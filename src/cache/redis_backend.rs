//! Redis Backend Module
//!
//! `KvBackend` over a multiplexed, auto-reconnecting Redis connection.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::info;

use crate::cache::backend::{BackendError, BackendResult, KvBackend, RawTtl};
use crate::cache::ServerInfo;
use crate::config::Config;

// == Redis Backend ==
/// Redis-backed store. Cloning the manager is cheap and shares one connection.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Opens the connection and verifies it with `PING`.
    ///
    /// The whole handshake is bounded by `connect_timeout`.
    pub async fn connect(config: &Config) -> BackendResult<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.redis_host.clone(), config.redis_port),
            redis: RedisConnectionInfo {
                db: config.redis_db,
                password: config.redis_password.clone(),
                ..Default::default()
            },
        };
        let client = redis::Client::open(info)?;

        let backend = with_timeout(config.connect_timeout(), async {
            let conn = ConnectionManager::new(client).await?;
            Ok(Self { conn })
        })
        .await?;

        with_timeout(config.connect_timeout(), backend.ping()).await?;
        info!(
            host = %config.redis_host,
            port = config.redis_port,
            db = config.redis_db,
            "Connected to Redis"
        );

        Ok(backend)
    }
}

async fn with_timeout<T>(
    limit: Duration,
    fut: impl std::future::Future<Output = BackendResult<T>>,
) -> BackendResult<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| BackendError::Timeout)?
}

#[async_trait]
impl KvBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> BackendResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> BackendResult<bool> {
        let mut conn = self.conn.clone();
        let reply: String = redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_secs)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(reply == "OK")
    }

    async fn del(&self, key: &str) -> BackendResult<u64> {
        let mut conn = self.conn.clone();
        let removed: u64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> BackendResult<bool> {
        let mut conn = self.conn.clone();
        let count: u64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(count > 0)
    }

    async fn ttl(&self, key: &str) -> BackendResult<RawTtl> {
        let mut conn = self.conn.clone();
        let reply: i64 = redis::cmd("TTL").arg(key).query_async(&mut conn).await?;
        Ok(RawTtl::from_reply(reply))
    }

    async fn flush_db(&self) -> BackendResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    async fn info(&self) -> BackendResult<ServerInfo> {
        let mut conn = self.conn.clone();
        let reply: String = redis::cmd("INFO").query_async(&mut conn).await?;
        Ok(ServerInfo::parse(&reply))
    }
}
