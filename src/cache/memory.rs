//! Memory Backend Module
//!
//! In-process key-value store with per-entry TTL, usable in place of Redis
//! for local runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::backend::{BackendResult, KvBackend, RawTtl};
use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, ServerInfo};

/// Minimum spacing between two expiry sweeps triggered by writes.
const SWEEP_INTERVAL_MS: u64 = 1000;

// == Memory Store ==
/// Synchronous map of entries with lazy expiry and lookup statistics.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Lookup statistics
    stats: CacheStats,
    /// Time of the last expiry sweep (Unix milliseconds)
    last_sweep_ms: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous value and TTL.
    ///
    /// Writes also drop expired entries, at most once per sweep interval, so
    /// keys that are never read again do not accumulate.
    pub fn set(&mut self, key: &str, value: Vec<u8>, ttl_secs: Option<u64>) {
        let now = current_timestamp_ms();
        if now.saturating_sub(self.last_sweep_ms) >= SWEEP_INTERVAL_MS {
            self.cleanup_expired();
            self.last_sweep_ms = now;
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl_secs));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the value if present and not expired.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        match self.live_entry(key) {
            Some(entry) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes a key, returning whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let existed = self.live_entry(key).is_some();
        self.entries.remove(key);
        self.stats.set_total_entries(self.entries.len());
        existed
    }

    pub fn exists(&mut self, key: &str) -> bool {
        self.live_entry(key).is_some()
    }

    pub fn ttl(&mut self, key: &str) -> RawTtl {
        match self.live_entry(key) {
            Some(entry) => match entry.ttl_remaining() {
                Some(secs) => RawTtl::Seconds(secs),
                None => RawTtl::NoExpiry,
            },
            None => RawTtl::Missing,
        }
    }

    // == Clear ==
    /// Removes every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Cleanup ==
    /// Removes every expired entry, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        self.stats.set_total_entries(self.entries.len());
        before - self.entries.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a key, dropping it first if it has expired.
    fn live_entry(&mut self, key: &str) -> Option<&CacheEntry> {
        if self.entries.get(key).is_some_and(CacheEntry::is_expired) {
            self.entries.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        self.entries.get(key)
    }
}

// == Memory Backend ==
/// `KvBackend` over a [`MemoryStore`] guarded by an async lock.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: RwLock<MemoryStore>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lookup statistics.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Number of stored entries, expired ones included until touched or swept.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> BackendResult<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        Ok(self.store.write().await.get(key))
    }

    async fn set_ex(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> BackendResult<bool> {
        self.store.write().await.set(key, value, Some(ttl_secs));
        Ok(true)
    }

    async fn del(&self, key: &str) -> BackendResult<u64> {
        Ok(u64::from(self.store.write().await.delete(key)))
    }

    async fn exists(&self, key: &str) -> BackendResult<bool> {
        Ok(self.store.write().await.exists(key))
    }

    async fn ttl(&self, key: &str) -> BackendResult<RawTtl> {
        Ok(self.store.write().await.ttl(key))
    }

    async fn flush_db(&self) -> BackendResult<()> {
        self.store.write().await.clear();
        Ok(())
    }

    async fn info(&self) -> BackendResult<ServerInfo> {
        let stats = self.store.read().await.stats();
        Ok(ServerInfo {
            redis_version: format!("memory-{}", env!("CARGO_PKG_VERSION")),
            connected_clients: 1,
            used_memory_human: format!("{} keys", stats.total_entries),
            keyspace_hits: stats.hits,
            keyspace_misses: stats.misses,
        })
    }
}
