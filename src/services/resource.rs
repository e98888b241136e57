use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::PasswordHasher;
use crate::cache::{cache_key, Cache};
use crate::config::PaginationConfig;
use crate::database::{Collection, Document, DocumentStore, FindQuery, StoreError};
use crate::models::Validate;

use super::ServiceError;

/// A typed view over one collection, with the request forms that write it.
#[async_trait]
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Singular name; also the cache key prefix.
    const NAME: &'static str;
    /// Used in client-facing messages, e.g. "Article Not Found!".
    const LABEL: &'static str;
    const COLLECTION: Collection;
    /// Whether a list without `limit` gets `pagination.default_limit`.
    /// Unpaged resources return every match unless the caller asks for less.
    const PAGED: bool = true;

    type CreateForm: DeserializeOwned + Validate + Send + 'static;
    type UpdateForm: DeserializeOwned + Validate + Send + 'static;

    /// Field values for a new document. Called after the form validated.
    async fn create_fields(
        form: Self::CreateForm,
        passwords: &PasswordHasher,
    ) -> Result<Map<String, Value>, ServiceError>;

    /// Partial field values for an update; absent form fields are left out.
    async fn update_fields(
        form: Self::UpdateForm,
        passwords: &PasswordHasher,
    ) -> Result<Map<String, Value>, ServiceError>;

    /// Field values that must not collide with another live document.
    fn unique_on_create(_form: &Self::CreateForm) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn unique_on_update(_form: &Self::UpdateForm) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(doc)?)
    }
}

/// CRUD for one resource: validation, the store, and the read-through cache.
///
/// Only `get` consults the cache. Writes go straight to the store and leave
/// any cached snapshot in place, so `get` may keep returning the state seen
/// at first population until the entry expires or is evicted.
pub struct ResourceService<R: Resource> {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn Cache>,
    passwords: PasswordHasher,
    cache_ttl: Duration,
    pagination: PaginationConfig,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
            passwords: self.passwords,
            cache_ttl: self.cache_ttl,
            pagination: self.pagination.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn Cache>,
        passwords: PasswordHasher,
        cache_ttl: Duration,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            store,
            cache,
            passwords,
            cache_ttl,
            pagination,
            _resource: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Page of documents. An explicit limit is clamped to `max_limit`; a missing
    /// one defaults to `default_limit` for paged resources only.
    pub async fn list(&self, query: FindQuery) -> Result<Vec<R>, ServiceError> {
        let query = self.paged(query);
        let docs = self.store.find_all(&query).await?;
        docs.into_iter()
            .map(|doc| R::from_document(doc).map_err(ServiceError::from))
            .collect()
    }

    /// Total matches for the query's filters, ignoring paging.
    pub async fn count(&self, query: &FindQuery) -> Result<u64, ServiceError> {
        Ok(self.store.count(query).await?)
    }

    /// Point lookup through the cache.
    pub async fn get(&self, id: Uuid) -> Result<R, ServiceError> {
        let key = cache_key(R::NAME, id);

        if let Some(bytes) = self.cache.get(&key).await? {
            debug!(%key, "cache hit");
            return serde_json::from_slice(&bytes).map_err(|e| ServiceError::CacheCorrupt {
                key,
                reason: e.to_string(),
            });
        }

        debug!(%key, "cache miss");
        let resource = self.fetch(id).await?;
        let bytes = serde_json::to_vec(&resource)?;
        if let Err(e) = self.cache.set(&key, &bytes, self.cache_ttl).await {
            warn!(%key, error = %e, "failed to populate cache");
        }
        Ok(resource)
    }

    /// Point lookup against the store only.
    pub async fn fetch(&self, id: Uuid) -> Result<R, ServiceError> {
        let doc = self.store.find_one(id).await.map_err(|e| self.not_found(e))?;
        Ok(R::from_document(doc)?)
    }

    /// First live document whose `field` equals `value`.
    pub async fn find_by(&self, field: &str, value: &str) -> Result<Option<R>, ServiceError> {
        match self.store.find_by_field(field, value).await? {
            Some(doc) => Ok(Some(R::from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, form: R::CreateForm) -> Result<R, ServiceError> {
        form.validate().map_err(ServiceError::validation)?;
        self.ensure_unique(R::unique_on_create(&form), None).await?;

        let fields = R::create_fields(form, &self.passwords).await?;
        let doc = self.store.insert(fields).await?;
        Ok(R::from_document(doc)?)
    }

    /// Partial update of a live document.
    pub async fn update(&self, id: Uuid, form: R::UpdateForm) -> Result<R, ServiceError> {
        form.validate().map_err(ServiceError::validation)?;

        let current = self.store.find_one(id).await.map_err(|e| self.not_found(e))?;
        if current.is_deleted {
            return Err(self.not_found(StoreError::NotFound(id.to_string())));
        }
        self.ensure_unique(R::unique_on_update(&form), Some(id)).await?;

        let fields = R::update_fields(form, &self.passwords).await?;
        let doc = self.store.update(id, fields).await.map_err(|e| self.not_found(e))?;
        Ok(R::from_document(doc)?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.store.soft_delete(id).await.map_err(|e| self.not_found(e))
    }

    fn paged(&self, mut query: FindQuery) -> FindQuery {
        query.limit = match query.limit.filter(|limit| *limit > 0) {
            Some(limit) => Some(limit.min(self.pagination.max_limit)),
            None if R::PAGED => Some(self.pagination.default_limit),
            None => None,
        };
        query.skip = query.skip.map(|skip| skip.max(0));
        query
    }

    async fn ensure_unique(
        &self,
        values: Vec<(&'static str, String)>,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut field_errors = HashMap::new();
        for (field, value) in values {
            if let Some(existing) = self.store.find_by_field(field, &value).await? {
                if Some(existing.id) != except {
                    field_errors.insert(field.to_string(), format!("{} is already taken", field));
                }
            }
        }

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::validation(field_errors))
        }
    }

    fn not_found(&self, err: StoreError) -> ServiceError {
        match err {
            StoreError::NotFound(_) => ServiceError::NotFound(format!("{} Not Found!", R::LABEL)),
            other => other.into(),
        }
    }
}
