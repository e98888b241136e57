use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::document::Document;
use super::query::{Collection, FindQuery};

/// Errors from a document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// A unique field value already belongs to another live document.
    #[error("Duplicate value for {0}")]
    Conflict(String),

    #[error("Invalid collection: {0}")]
    InvalidCollection(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::Conflict(db.constraint().unwrap_or("unique constraint").to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Persistence for one logical collection.
///
/// Every call is a single atomic statement against the backing store. There is
/// no cross-document transaction and no version check; concurrent writers to
/// the same id are last-write-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Scan ordered by id (creation order).
    async fn find_all(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError>;

    /// Matches for `query`, ignoring `limit` and `skip`.
    async fn count(&self, query: &FindQuery) -> Result<u64, StoreError>;

    /// Point lookup. Soft-deleted documents are returned as-is.
    async fn find_one(&self, id: Uuid) -> Result<Document, StoreError>;

    /// Exact match on a top-level field among non-deleted documents.
    async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<Document>, StoreError>;

    /// Fails with `Conflict` when a unique field collides with a live document.
    async fn insert(&self, fields: Map<String, Value>) -> Result<Document, StoreError>;

    /// Merges `fields` into a non-deleted document and stamps `updated_at`.
    /// Unique fields are enforced as on insert.
    async fn update(&self, id: Uuid, fields: Map<String, Value>) -> Result<Document, StoreError>;

    /// Flags the document deleted; it stays physically present.
    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Runs a driver call under a fixed deadline.
pub async fn with_deadline<T, E, F>(deadline: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<StoreError>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(StoreError::Timeout(deadline)),
    }
}

pub(crate) fn not_found(collection: &Collection, id: Uuid) -> StoreError {
    StoreError::NotFound(format!("no document {} in {}", id, collection.name))
}
