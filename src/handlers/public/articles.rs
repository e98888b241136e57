use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use serde_json::{json, Value};

use crate::database::FindQuery;
use crate::handlers::utils::{find_query, json_body, parse_id};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Article, CreateArticleForm, UpdateArticleForm};
use crate::state::AppState;

/// GET /articles - page of articles in creation order
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<FindQuery>, QueryRejection>,
) -> ApiResult<Vec<Article>> {
    let query = find_query(query)?;
    let articles = state.articles.list(query).await?;
    Ok(ApiResponse::success(articles))
}

/// GET /articles/:id - read-through lookup
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Article> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.articles.get(id).await?))
}

/// POST /articles
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateArticleForm>, JsonRejection>,
) -> ApiResult<Article> {
    let form = json_body(payload)?;
    let article = state.articles.create(form).await?;
    tracing::info!(id = %article.id, "article created");
    Ok(ApiResponse::success(article))
}

/// PUT /articles/:id - partial update of a live article
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateArticleForm>, JsonRejection>,
) -> ApiResult<Article> {
    let id = parse_id(&id)?;
    let form = json_body(payload)?;
    let article = state.articles.update(id, form).await?;
    tracing::info!(%id, "article updated");
    Ok(ApiResponse::success(article))
}

/// DELETE /articles/:id - soft delete
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    state.articles.delete(id).await?;
    tracing::info!(%id, "article deleted");
    Ok(ApiResponse::success(json!({ "message": "Article Deleted" })))
}
