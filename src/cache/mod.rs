//! Cache Module
//!
//! Read-through cache plumbing: key derivation, value encoding, and a
//! soft-failing client over a Redis or in-process backend.

pub mod backend;
pub mod client;
pub mod codec;
mod entry;
mod info;
pub mod key;
mod memory;
mod redis_backend;
mod stats;


// Re-export public types
pub use backend::{BackendError, KvBackend, RawTtl};
pub use client::{CacheClient, CacheHealth, KeyTtl};
pub use codec::{CodecError, Encoded, Storable};
pub use entry::CacheEntry;
pub use info::ServerInfo;
pub use key::{derive_key, CacheKey, KeyDeriver, DEFAULT_KEY_PREFIX};
pub use memory::{MemoryBackend, MemoryStore};
pub use redis_backend::RedisBackend;
pub use stats::CacheStats;
