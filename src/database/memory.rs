use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::document::Document;
use super::query::{Collection, FindQuery};
use super::store::{not_found, DocumentStore, StoreError};

/// Process-local store for development and tests.
///
/// Keyed by UUIDv7, so iteration order is creation order like the SQL store.
pub struct MemoryDocumentStore {
    collection: Collection,
    documents: RwLock<BTreeMap<Uuid, Document>>,
}

impl MemoryDocumentStore {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    fn matches(&self, doc: &Document, query: &FindQuery) -> bool {
        if doc.is_deleted && !query.include_deleted {
            return false;
        }
        query.matches_text(self.collection.search_fields.iter().filter_map(|f| doc.field_str(f)))
    }

    /// First unique field of `fields` whose value a different live document holds.
    fn conflict(
        &self,
        documents: &BTreeMap<Uuid, Document>,
        fields: &Map<String, Value>,
        except: Option<Uuid>,
    ) -> Option<StoreError> {
        self.collection.unique_fields.iter().find_map(|field| {
            let value = fields.get(*field)?;
            documents
                .values()
                .any(|doc| !doc.is_deleted && Some(doc.id) != except && doc.fields.get(*field) == Some(value))
                .then(|| StoreError::Conflict(field.to_string()))
        })
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_all(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        let documents = self.documents.read().await;
        let skip = query.skip.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);

        Ok(documents
            .values()
            .filter(|doc| self.matches(doc, query))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, query: &FindQuery) -> Result<u64, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.values().filter(|doc| self.matches(doc, query)).count() as u64)
    }

    async fn find_one(&self, id: Uuid) -> Result<Document, StoreError> {
        self.documents
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(&self.collection, id))
    }

    async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .find(|doc| !doc.is_deleted && doc.field_str(field) == Some(value))
            .cloned())
    }

    async fn insert(&self, fields: Map<String, Value>) -> Result<Document, StoreError> {
        let mut documents = self.documents.write().await;
        if let Some(conflict) = self.conflict(&documents, &fields, None) {
            return Err(conflict);
        }
        let doc = Document::new(fields);
        documents.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn update(&self, id: Uuid, fields: Map<String, Value>) -> Result<Document, StoreError> {
        let mut documents = self.documents.write().await;
        if let Some(conflict) = self.conflict(&documents, &fields, Some(id)) {
            return Err(conflict);
        }
        match documents.get_mut(&id) {
            Some(doc) if !doc.is_deleted => {
                doc.merge(fields);
                Ok(doc.clone())
            }
            _ => Err(not_found(&self.collection, id)),
        }
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let doc = documents.get_mut(&id).ok_or_else(|| not_found(&self.collection, id))?;
        doc.is_deleted = true;
        doc.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
