use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::document::{strip_reserved, Document, DocumentRow};
use super::query::{Collection, FindQuery, WhereClause};
use super::store::{not_found, with_deadline, DocumentStore, StoreError};

const COLUMNS: &str = "id, body, is_deleted, created_at, updated_at";

/// Collection table in PostgreSQL with the fields held in a JSONB `body`.
pub struct PgDocumentStore {
    pool: PgPool,
    collection: Collection,
    timeout: Duration,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, collection: Collection, timeout: Duration) -> Result<Self, StoreError> {
        collection.validate()?;
        Ok(Self { pool, collection, timeout })
    }

    fn table(&self) -> String {
        format!("\"{}\"", self.collection.name)
    }

    /// Reports a unique violation by field name rather than index name.
    fn name_conflict(&self, err: StoreError) -> StoreError {
        match err {
            StoreError::Conflict(constraint) => {
                let field = self
                    .collection
                    .unique_fields
                    .iter()
                    .find(|field| constraint.contains(*field))
                    .map_or(constraint, |field| field.to_string());
                StoreError::Conflict(field)
            }
            other => other,
        }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_all(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        let clause = WhereClause::build(&self.collection, query);
        let mut sql = format!("SELECT {} FROM {} WHERE {} ORDER BY id", COLUMNS, self.table(), clause.sql);
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", limit.max(0)));
        }
        if let Some(skip) = query.skip {
            sql.push_str(&format!(" OFFSET {}", skip.max(0)));
        }
        debug!(collection = self.collection.name, %sql, "find_all");

        let mut q = sqlx::query_as::<_, DocumentRow>(&sql);
        for param in &clause.params {
            q = q.bind(param);
        }
        let rows = with_deadline(self.timeout, q.fetch_all(&self.pool)).await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn count(&self, query: &FindQuery) -> Result<u64, StoreError> {
        let clause = WhereClause::build(&self.collection, query);
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", self.table(), clause.sql);

        let mut q = sqlx::query_scalar::<_, i64>(&sql);
        for param in &clause.params {
            q = q.bind(param);
        }
        let count = with_deadline(self.timeout, q.fetch_one(&self.pool)).await?;
        Ok(count.max(0) as u64)
    }

    async fn find_one(&self, id: Uuid) -> Result<Document, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", COLUMNS, self.table());
        let row = with_deadline(
            self.timeout,
            sqlx::query_as::<_, DocumentRow>(&sql).bind(id).fetch_optional(&self.pool),
        )
        .await?;

        row.map(Document::from).ok_or_else(|| not_found(&self.collection, id))
    }

    async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE \"body\"->>$1 = $2 AND \"is_deleted\" = FALSE ORDER BY id LIMIT 1",
            COLUMNS,
            self.table()
        );
        let row = with_deadline(
            self.timeout,
            sqlx::query_as::<_, DocumentRow>(&sql).bind(field).bind(value).fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(Document::from))
    }

    async fn insert(&self, fields: Map<String, Value>) -> Result<Document, StoreError> {
        let doc = Document::new(fields);
        let sql = format!(
            "INSERT INTO {} ({cols}) VALUES ($1, $2, $3, $4, $5) RETURNING {cols}",
            self.table(),
            cols = COLUMNS
        );
        // TIMESTAMPTZ keeps microseconds; return what was stored, not `doc`.
        let row = with_deadline(
            self.timeout,
            sqlx::query_as::<_, DocumentRow>(&sql)
                .bind(doc.id)
                .bind(Json(&doc.fields))
                .bind(doc.is_deleted)
                .bind(doc.created_at)
                .bind(doc.updated_at)
                .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| self.name_conflict(e))?;

        info!(collection = self.collection.name, id = %row.id, "document inserted");
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, fields: Map<String, Value>) -> Result<Document, StoreError> {
        let fields = strip_reserved(fields);
        let sql = format!(
            "UPDATE {} SET body = body || $2, updated_at = $3 WHERE id = $1 AND \"is_deleted\" = FALSE RETURNING {}",
            self.table(),
            COLUMNS
        );
        let row = with_deadline(
            self.timeout,
            sqlx::query_as::<_, DocumentRow>(&sql)
                .bind(id)
                .bind(Json(&fields))
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await
        .map_err(|e| self.name_conflict(e))?;

        match row {
            Some(row) => {
                info!(collection = self.collection.name, %id, "document updated");
                Ok(row.into())
            }
            None => Err(not_found(&self.collection, id)),
        }
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        let sql = format!(
            "UPDATE {} SET \"is_deleted\" = TRUE, updated_at = $2 WHERE id = $1",
            self.table()
        );
        let result = with_deadline(
            self.timeout,
            sqlx::query(&sql).bind(id).bind(Utc::now()).execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(&self.collection, id));
        }
        info!(collection = self.collection.name, %id, "document soft-deleted");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        with_deadline(self.timeout, sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }
}
