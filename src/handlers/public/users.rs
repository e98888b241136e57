use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use serde::Serialize;
use serde_json::{json, Value};

use crate::database::FindQuery;
use crate::handlers::utils::{find_query, json_body, parse_id};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{CreateUserForm, UpdateUserForm, User};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<User>,
    /// Matches for the filters, ignoring limit/skip.
    pub count: u64,
}

/// GET /users - page of users plus the total match count
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<FindQuery>, QueryRejection>,
) -> ApiResult<UserList> {
    let query = find_query(query)?;
    let count = state.users.count(&query).await?;
    let users = state.users.list(query).await?;
    Ok(ApiResponse::success(UserList { users, count }))
}

/// GET /users/:id - read-through lookup
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.users.get(id).await?))
}

/// POST /users
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserForm>, JsonRejection>,
) -> ApiResult<User> {
    let form = json_body(payload)?;
    let user = state.users.create(form).await?;
    tracing::info!(id = %user.id, username = %user.username, "user created");
    Ok(ApiResponse::success(user))
}

/// PUT /users/:id - partial update of a live user
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserForm>, JsonRejection>,
) -> ApiResult<User> {
    let id = parse_id(&id)?;
    let form = json_body(payload)?;
    let user = state.users.update(id, form).await?;
    tracing::info!(%id, "user updated");
    Ok(ApiResponse::success(user))
}

/// DELETE /users/:id - soft delete
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    state.users.delete(id).await?;
    tracing::info!(%id, "user deleted");
    Ok(ApiResponse::success(json!({ "message": "User Deleted" })))
}
