use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tracing::info;

use crate::config::redact_url;

use super::{Cache, CacheError};

/// Redis-backed cache. The connection manager reconnects on its own; calls
/// made while it is down fail with `Unavailable`.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    timeout: Duration,
}

impl RedisCache {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let connection = bounded(timeout, ConnectionManager::new(client)).await?;
        info!("Connected to cache at: {}", redact_url(url));
        Ok(Self { connection, timeout })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection.clone();
        bounded(self.timeout, conn.get::<_, Option<Vec<u8>>>(key)).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        if ttl.is_zero() {
            bounded(self.timeout, conn.set::<_, _, ()>(key, value)).await
        } else {
            // Sub-second TTLs round up so the entry is not written already expired.
            let secs = ttl.as_secs().max(1);
            bounded(self.timeout, conn.set_ex::<_, _, ()>(key, value, secs)).await
        }
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let _: String = bounded(self.timeout, redis::cmd("PING").query_async(&mut conn)).await?;
        Ok(())
    }
}

async fn bounded<T, F>(deadline: Duration, fut: F) -> Result<T, CacheError>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(unavailable),
        Err(_) => Err(CacheError::Timeout(deadline)),
    }
}

fn unavailable(err: redis::RedisError) -> CacheError {
    CacheError::Unavailable(err.to_string())
}
