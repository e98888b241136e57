use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::PasswordHasher;
use crate::database::Collection;
use crate::services::{Resource, ServiceError};

use super::{FieldErrors, FieldValidator, Validate};

const TITLE_LEN: (usize, usize) = (3, 100);
const CONTENT_LEN: (usize, usize) = (3, 1000);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateArticleForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl Validate for CreateArticleForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        FieldValidator::new()
            .required("title", &self.title)
            .length("title", &self.title, TITLE_LEN.0, TITLE_LEN.1)
            .required("content", &self.content)
            .length("content", &self.content, CONTENT_LEN.0, CONTENT_LEN.1)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArticleForm {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl Validate for UpdateArticleForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut validator = FieldValidator::new();
        if let Some(title) = &self.title {
            validator.length("title", title, TITLE_LEN.0, TITLE_LEN.1);
        }
        if let Some(content) = &self.content {
            validator.length("content", content, CONTENT_LEN.0, CONTENT_LEN.1);
        }
        validator.finish()
    }
}

#[async_trait]
impl Resource for Article {
    const NAME: &'static str = "article";
    const LABEL: &'static str = "Article";
    const COLLECTION: Collection = Collection::new("articles", &["title", "content"]);
    const PAGED: bool = false;

    type CreateForm = CreateArticleForm;
    type UpdateForm = UpdateArticleForm;

    async fn create_fields(
        form: CreateArticleForm,
        _passwords: &PasswordHasher,
    ) -> Result<Map<String, Value>, ServiceError> {
        let mut fields = Map::new();
        fields.insert("title".to_string(), Value::String(form.title));
        fields.insert("content".to_string(), Value::String(form.content));
        Ok(fields)
    }

    async fn update_fields(
        form: UpdateArticleForm,
        _passwords: &PasswordHasher,
    ) -> Result<Map<String, Value>, ServiceError> {
        let mut fields = Map::new();
        if let Some(title) = form.title {
            fields.insert("title".to_string(), Value::String(title));
        }
        if let Some(content) = form.content {
            fields.insert("content".to_string(), Value::String(content));
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_form_enforces_bounds() {
        let form = CreateArticleForm {
            title: "ab".to_string(),
            content: "x".repeat(1001),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.contains_key("title"));
        assert!(errors.contains_key("content"));

        let ok = CreateArticleForm {
            title: "A title".to_string(),
            content: "hello".to_string(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn missing_create_fields_are_required() {
        let form: CreateArticleForm = serde_json::from_str("{}").unwrap();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors["title"], "This field is required");
        assert_eq!(errors["content"], "This field is required");
    }

    #[test]
    fn update_form_checks_only_present_fields() {
        assert!(UpdateArticleForm::default().validate().is_ok());
        let form = UpdateArticleForm {
            title: Some("no".to_string()),
            content: None,
        };
        assert!(form.validate().unwrap_err().contains_key("title"));
    }

    #[tokio::test]
    async fn update_fields_leave_out_absent_values() {
        let form = UpdateArticleForm {
            title: Some("B title".to_string()),
            content: None,
        };
        let fields = Article::update_fields(form, &PasswordHasher::new(4)).await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["title"], Value::String("B title".to_string()));
    }
}
