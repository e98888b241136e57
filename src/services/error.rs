use std::collections::HashMap;
use thiserror::Error;

use crate::auth::AuthError;
use crate::cache::CacheError;
use crate::database::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Corrupt cache entry {key}: {reason}")]
    CacheCorrupt { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is no longer active")]
    InactiveAccount,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ServiceError {
    pub fn validation(field_errors: HashMap<String, String>) -> Self {
        ServiceError::Validation {
            message: "Validation failed".to_string(),
            field_errors,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ServiceError::NotFound(msg),
            StoreError::Conflict(field) => {
                let message = format!("{} is already taken", field);
                ServiceError::validation(HashMap::from([(field, message)]))
            }
            other => ServiceError::Store(other),
        }
    }
}
