use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::PasswordHasher;
use crate::database::Collection;
use crate::services::{Resource, ServiceError};

use super::{FieldErrors, FieldValidator, Validate};

const USERNAME_LEN: (usize, usize) = (3, 50);
const NAME_LEN: (usize, usize) = (1, 100);
const PASSWORD_LEN: (usize, usize) = (8, 72);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// bcrypt hash; read from the store, never written to responses or the cache.
    #[serde(rename = "password", default, skip_serializing)]
    pub password_hash: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for CreateUserForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        FieldValidator::new()
            .required("username", &self.username)
            .length("username", &self.username, USERNAME_LEN.0, USERNAME_LEN.1)
            .required("email", &self.email)
            .email("email", &self.email)
            .required("first_name", &self.first_name)
            .length("first_name", &self.first_name, NAME_LEN.0, NAME_LEN.1)
            .required("last_name", &self.last_name)
            .length("last_name", &self.last_name, NAME_LEN.0, NAME_LEN.1)
            .required("password", &self.password)
            .length("password", &self.password, PASSWORD_LEN.0, PASSWORD_LEN.1)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl Validate for UpdateUserForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut validator = FieldValidator::new();
        if let Some(username) = &self.username {
            validator.length("username", username, USERNAME_LEN.0, USERNAME_LEN.1);
        }
        if let Some(email) = &self.email {
            validator.email("email", email);
        }
        if let Some(first_name) = &self.first_name {
            validator.required("first_name", first_name);
        }
        if let Some(last_name) = &self.last_name {
            validator.required("last_name", last_name);
        }
        if let Some(password) = &self.password {
            validator.length("password", password, PASSWORD_LEN.0, PASSWORD_LEN.1);
        }
        validator.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        FieldValidator::new()
            .required("username", &self.username)
            .required("password", &self.password)
            .finish()
    }
}

#[async_trait]
impl Resource for User {
    const NAME: &'static str = "user";
    const LABEL: &'static str = "User";
    const COLLECTION: Collection =
        Collection::new("users", &["email", "username", "first_name", "last_name"]).with_unique(&["username"]);

    type CreateForm = CreateUserForm;
    type UpdateForm = UpdateUserForm;

    async fn create_fields(
        form: CreateUserForm,
        passwords: &PasswordHasher,
    ) -> Result<Map<String, Value>, ServiceError> {
        let hashed = passwords.hash(form.password).await?;

        let mut fields = Map::new();
        fields.insert("username".to_string(), Value::String(form.username));
        fields.insert("email".to_string(), Value::String(form.email));
        fields.insert("first_name".to_string(), Value::String(form.first_name));
        fields.insert("last_name".to_string(), Value::String(form.last_name));
        fields.insert("password".to_string(), Value::String(hashed));
        Ok(fields)
    }

    async fn update_fields(
        form: UpdateUserForm,
        passwords: &PasswordHasher,
    ) -> Result<Map<String, Value>, ServiceError> {
        let mut fields = Map::new();
        let plain = [
            ("username", form.username),
            ("email", form.email),
            ("first_name", form.first_name),
            ("last_name", form.last_name),
        ];
        for (name, value) in plain {
            if let Some(value) = value {
                fields.insert(name.to_string(), Value::String(value));
            }
        }
        if let Some(password) = form.password {
            fields.insert("password".to_string(), Value::String(passwords.hash(password).await?));
        }
        Ok(fields)
    }

    fn unique_on_create(form: &CreateUserForm) -> Vec<(&'static str, String)> {
        vec![("username", form.username.clone())]
    }

    fn unique_on_update(form: &UpdateUserForm) -> Vec<(&'static str, String)> {
        form.username.iter().map(|u| ("username", u.clone())).collect()
    }
}
