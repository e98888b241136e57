use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::{PasswordHasher, TokenService};
use crate::cache::{Cache, MemoryCache, RedisCache};
use crate::config::{AppConfig, CacheBackend, StoreBackend};
use crate::database::{DatabaseManager, DocumentStore, MemoryDocumentStore, PgDocumentStore};
use crate::models::{Article, User};
use crate::services::{AuthService, Resource, ResourceService};

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub articles: ResourceService<Article>,
    pub users: ResourceService<User>,
    pub auth: AuthService,
    cache: Arc<dyn Cache>,
    database: Option<DatabaseManager>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub store: String,
    pub cache: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

impl AppState {
    /// Connects the configured store and cache backends.
    pub async fn connect(config: AppConfig) -> anyhow::Result<Self> {
        let timeout = config.operation_timeout();

        let mut database = None;
        let (articles, users): (Arc<dyn DocumentStore>, Arc<dyn DocumentStore>) = match config.database.backend {
            StoreBackend::Postgres => {
                let manager = DatabaseManager::connect(&config.database)
                    .await
                    .context("failed to connect document store")?;
                let stores: (Arc<dyn DocumentStore>, Arc<dyn DocumentStore>) = (
                    Arc::new(PgDocumentStore::new(manager.pool(), Article::COLLECTION, timeout)?),
                    Arc::new(PgDocumentStore::new(manager.pool(), User::COLLECTION, timeout)?),
                );
                database = Some(manager);
                stores
            }
            StoreBackend::Memory => {
                info!("Using in-memory document store");
                (
                    Arc::new(MemoryDocumentStore::new(Article::COLLECTION)),
                    Arc::new(MemoryDocumentStore::new(User::COLLECTION)),
                )
            }
        };

        let cache: Arc<dyn Cache> = match config.cache.backend {
            CacheBackend::Redis => {
                let url = config.cache.url.as_deref().context("REDIS_URL is not configured")?;
                Arc::new(
                    RedisCache::connect(url, timeout)
                        .await
                        .context("failed to connect cache")?,
                )
            }
            CacheBackend::Memory => {
                info!("Using in-memory cache");
                Arc::new(MemoryCache::new())
            }
        };

        let mut state = Self::from_parts(config, articles, users, cache)?;
        state.database = database;
        Ok(state)
    }

    /// Memory backends only; nothing to connect.
    pub fn in_memory(config: AppConfig) -> anyhow::Result<Self> {
        Self::from_parts(
            config,
            Arc::new(MemoryDocumentStore::new(Article::COLLECTION)),
            Arc::new(MemoryDocumentStore::new(User::COLLECTION)),
            Arc::new(MemoryCache::new()),
        )
    }

    pub fn from_parts(
        config: AppConfig,
        articles: Arc<dyn DocumentStore>,
        users: Arc<dyn DocumentStore>,
        cache: Arc<dyn Cache>,
    ) -> anyhow::Result<Self> {
        let passwords = PasswordHasher::new(config.security.password_hash_cost);
        let tokens = TokenService::from_config(&config.security).context("invalid token configuration")?;
        let ttl = config.cache_ttl();

        let articles = ResourceService::new(articles, cache.clone(), passwords, ttl, config.pagination.clone());
        let users = ResourceService::new(users, cache.clone(), passwords, ttl, config.pagination.clone());
        let auth = AuthService::new(users.clone(), tokens, passwords);

        Ok(Self {
            config: Arc::new(config),
            articles,
            users,
            auth,
            cache,
            database: None,
        })
    }

    /// Closes the database pool, if one was connected.
    pub async fn shutdown(&self) {
        if let Some(database) = &self.database {
            database.close().await;
        }
    }

    /// Pings the store and the cache.
    pub async fn health(&self) -> HealthReport {
        let store = match self.articles.store().ping().await {
            Ok(()) => "ok".to_string(),
            Err(e) => {
                tracing::warn!("store health check failed: {}", e);
                e.to_string()
            }
        };
        let cache = match self.cache.ping().await {
            Ok(()) => "ok".to_string(),
            Err(e) => {
                tracing::warn!("cache health check failed: {}", e);
                e.to_string()
            }
        };

        let status = if store == "ok" && cache == "ok" { "ok" } else { "degraded" };
        HealthReport {
            status,
            store,
            cache,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_without_database_leaves_memory_backends_usable() {
        let state = AppState::in_memory(AppConfig::development()).unwrap();
        state.shutdown().await;

        let report = state.health().await;
        assert!(report.is_ok());
    }
}
