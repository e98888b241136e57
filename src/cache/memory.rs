use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{Cache, CacheError};

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-process cache for development and tests. Expired entries are dropped
/// lazily on read.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites an entry with arbitrary bytes.
    pub async fn put_raw(&self, key: &str, value: Vec<u8>) {
        self.entries.write().await.insert(
            key.to_string(),
            Entry { value, expires_at: None },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let expires_at = (!ttl.is_zero()).then(|| Instant::now() + ttl);
        self.entries.write().await.insert(
            key.to_string(),
            Entry { value: value.to_vec(), expires_at },
        );
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.set("article_1", b"{}", Duration::ZERO).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("article_1").await.unwrap(), Some(b"{}".to_vec()));
    }

    #[tokio::test]
    async fn ttl_entries_expire_and_are_dropped() {
        let cache = MemoryCache::new();
        cache.set("article_1", b"{}", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("article_1").await.unwrap(), None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn set_overwrites() {
        let cache = MemoryCache::new();
        cache.set("k", b"one", Duration::ZERO).await.unwrap();
        cache.set("k", b"two", Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }
}
