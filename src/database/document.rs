use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Keys owned by the store; never accepted as document fields.
pub const RESERVED_FIELDS: &[&str] = &["_id", "id", "is_deleted", "created_at", "updated_at"];

/// A stored document: store-managed metadata plus free-form field values.
///
/// Serializes flat, e.g. `{"_id": "...", "title": "A", "is_deleted": false, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Builds a fresh, not-yet-persisted document with a time-ordered id.
    pub fn new(fields: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            fields: strip_reserved(fields),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Shallow merge, matching a `$set` of top-level keys.
    pub fn merge(&mut self, fields: Map<String, Value>) {
        for (key, value) in strip_reserved(fields) {
            self.fields.insert(key, value);
        }
        self.updated_at = Utc::now();
    }
}

pub fn strip_reserved(mut fields: Map<String, Value>) -> Map<String, Value> {
    fields.retain(|key, _| !RESERVED_FIELDS.contains(&key.as_str()));
    fields
}

/// Row shape of a collection table.
#[derive(Debug, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub body: Json<Map<String, Value>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            fields: row.body.0,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
