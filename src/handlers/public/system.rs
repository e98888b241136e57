use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service info
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "articles": "/articles[/:id]",
            "users": "/users[/:id]",
            "login": "/auth/login",
            "me": "/auth/me (bearer token)",
        }
    }))
}

/// GET /health - store and cache reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.health().await;
    let status = if report.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
