// HTTP API Error Types
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::StoreError;
use crate::services::ServiceError;

/// HTTP API error. Every variant renders as `{"message": ...}`.
#[derive(Debug)]
pub enum ApiError {
    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found (also malformed ids and corrupt cache entries)
    NotFound(String),

    // 406 Not Acceptable (validation and malformed input)
    NotAcceptable {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable (store or cache down / timed out)
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::NotAcceptable { message, .. } => message,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({ "message": self.message() });
        if let ApiError::NotAcceptable { field_errors: Some(field_errors), .. } = self {
            body["field_errors"] = json!(field_errors);
        }
        body
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        ApiError::NotAcceptable {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Path identifiers that are not canonical UUIDs.
    pub fn invalid_parameter() -> Self {
        ApiError::NotFound("Invalid parameter".to_string())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { message, field_errors } => ApiError::NotAcceptable {
                message,
                field_errors: Some(field_errors),
            },
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Store(store_err) => store_err.into(),
            ServiceError::Cache(cache_err) => {
                tracing::error!("Cache error: {}", cache_err);
                ApiError::service_unavailable("Cache temporarily unavailable")
            }
            ServiceError::CacheCorrupt { key, reason } => {
                tracing::error!(%key, "Corrupt cache entry: {}", reason);
                ApiError::not_found("Invalid Cache")
            }
            ServiceError::Serialization(e) => {
                tracing::error!("JSON serialization error: {}", e);
                ApiError::internal_server_error("Failed to format response")
            }
            ServiceError::InvalidCredentials => ApiError::unauthorized("Invalid username or password"),
            ServiceError::InactiveAccount => ApiError::unauthorized("Account is no longer active"),
            ServiceError::Auth(auth_err) => auth_err.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::not_found(msg),
            StoreError::Conflict(field) => ServiceError::from(StoreError::Conflict(field)).into(),
            StoreError::Unavailable(msg) => {
                // Don't expose driver errors to clients
                tracing::error!("Store unavailable: {}", msg);
                ApiError::service_unavailable("Store temporarily unavailable")
            }
            StoreError::Timeout(after) => {
                tracing::error!("Store timeout after {:?}", after);
                ApiError::service_unavailable("Store request timed out")
            }
            StoreError::InvalidCollection(name) => {
                tracing::error!("Invalid collection: {}", name);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            StoreError::Migration(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(msg) => ApiError::unauthorized(format!("Invalid JWT token: {}", msg)),
            other => {
                tracing::error!("Auth error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(rejection.body_text());
        }
        ApiError::not_acceptable(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::not_acceptable(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_fields() {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), "This field is required".to_string());
        let err = ApiError::from(ServiceError::validation(fields));

        assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
        let body = err.to_json();
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["field_errors"]["title"], "This field is required");
    }

    #[test]
    fn unique_conflict_names_the_field() {
        let err = ApiError::from(ServiceError::from(StoreError::Conflict("username".to_string())));
        assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(err.to_json()["field_errors"]["username"], "username is already taken");
    }

    #[test]
    fn driver_details_stay_server_side() {
        let err = ApiError::from(ServiceError::Store(StoreError::Unavailable("password=hunter2".to_string())));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.message().contains("hunter2"));
    }

    #[test]
    fn corrupt_cache_is_not_found() {
        let err = ApiError::from(ServiceError::CacheCorrupt {
            key: "article_x".to_string(),
            reason: "eof".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_json(), json!({ "message": "Invalid Cache" }));
    }
}
