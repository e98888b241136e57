use serde::Deserialize;

use super::store::StoreError;

/// A logical collection: backing table plus the fields free-text search scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub name: &'static str,
    pub search_fields: &'static [&'static str],
    /// Fields no two live documents may share.
    pub unique_fields: &'static [&'static str],
}

impl Collection {
    pub const fn new(name: &'static str, search_fields: &'static [&'static str]) -> Self {
        Self {
            name,
            search_fields,
            unique_fields: &[],
        }
    }

    pub const fn with_unique(self, unique_fields: &'static [&'static str]) -> Self {
        Self {
            name: self.name,
            search_fields: self.search_fields,
            unique_fields,
        }
    }

    /// Rejects names that cannot be safely interpolated into SQL.
    pub fn validate(&self) -> Result<(), StoreError> {
        if !is_identifier(self.name) {
            return Err(StoreError::InvalidCollection(self.name.to_string()));
        }
        let mut fields = self.search_fields.iter().chain(self.unique_fields);
        if let Some(field) = fields.find(|f| !is_identifier(f)) {
            return Err(StoreError::InvalidCollection(format!("{}.{}", self.name, field)));
        }
        Ok(())
    }
}

/// Filter and paging for a collection scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FindQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
}

impl FindQuery {
    /// Search term with surrounding whitespace removed; blank means no search.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Case-insensitive substring test across `fields` of a document.
    pub fn matches_text<'a>(&self, mut values: impl Iterator<Item = &'a str>) -> bool {
        match self.search_term() {
            None => true,
            Some(term) => {
                let needle = term.to_lowercase();
                values.any(|v| v.to_lowercase().contains(&needle))
            }
        }
    }
}

/// WHERE clause for a scan, with its bind values in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub sql: String,
    pub params: Vec<String>,
}

impl WhereClause {
    pub fn build(collection: &Collection, query: &FindQuery) -> Self {
        let mut conditions = vec![];
        let mut params = vec![];

        if !query.include_deleted {
            conditions.push("\"is_deleted\" = FALSE".to_string());
        }

        if let Some(term) = query.search_term() {
            if !collection.search_fields.is_empty() {
                params.push(format!("%{}%", escape_like(term)));
                let index = params.len();
                let any_field = collection
                    .search_fields
                    .iter()
                    .map(|field| format!("\"body\"->>'{}' ILIKE ${} ESCAPE '\\'", field, index))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                conditions.push(format!("({})", any_field));
            }
        }

        let sql = if conditions.is_empty() { "TRUE".to_string() } else { conditions.join(" AND ") };
        Self { sql, params }
    }
}

/// Escapes LIKE metacharacters so the term matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
