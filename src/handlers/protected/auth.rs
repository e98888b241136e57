use axum::extract::{Extension, State};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::User;
use crate::state::AppState;

/// GET /auth/me - the user named by the bearer token
pub async fn me(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<User> {
    let user = state.auth.current_user(auth.user_id).await?;
    Ok(ApiResponse::success(user))
}
