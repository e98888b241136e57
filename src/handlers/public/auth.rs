use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};

use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::LoginForm;
use crate::services::LoginResponse;
use crate::state::AppState;

/// POST /auth/login - exchange username and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginForm>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let form = json_body(payload)?;
    let username = form.username.clone();

    match state.auth.login(form).await {
        Ok(response) => Ok(ApiResponse::success(response)),
        Err(e) => {
            tracing::warn!(%username, "login failed: {}", e);
            Err(e.into())
        }
    }
}
