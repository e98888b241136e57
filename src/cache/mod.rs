//! Key/value side-channel consulted before the store on point lookups.
//!
//! Entries are written after a store miss and are never touched by write
//! paths, so a cached snapshot can outlive later updates until the entry
//! expires (when a TTL is set) or is evicted externally.

mod memory;
mod redis;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Unconditional overwrite. A zero `ttl` means the entry never expires.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

/// `"<resource>_<id>"`, e.g. `article_0190f7a4-...`.
pub fn cache_key(resource: &str, id: Uuid) -> String {
    format!("{}_{}", resource, id)
}
