use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use uuid::Uuid;

use crate::database::FindQuery;
use crate::error::ApiError;

/// Path ids must be canonical UUIDs; anything else is treated as not found.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid_parameter())
}

/// Unwraps a JSON body, mapping malformed input to 406 and oversize to 413.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(ApiError::from)
}

pub fn find_query(query: Result<Query<FindQuery>, QueryRejection>) -> Result<FindQuery, ApiError> {
    query.map(|Query(query)| query).map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn malformed_ids_are_not_found() {
        for raw in ["", "123", "not-a-uuid", "0190f7a4-5b7e-7c3d-9a1b"] {
            let err = parse_id(raw).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
            assert_eq!(err.message(), "Invalid parameter");
        }
    }

    #[test]
    fn canonical_ids_parse() {
        let id = Uuid::now_v7();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
