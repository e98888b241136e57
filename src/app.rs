use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full HTTP surface with global layers applied per `AppConfig`.
pub fn router(state: AppState) -> Router {
    let api = &state.config.api;
    let security = &state.config.security;

    let mut app = Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(article_routes())
        .merge(user_routes())
        .merge(auth_public_routes())
        // Protected
        .merge(auth_routes(state.clone()))
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes));

    if api.enable_response_compression {
        app = app.layer(CompressionLayer::new());
    }
    if security.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

fn article_routes() -> Router<AppState> {
    use public::articles;

    Router::new()
        .route("/articles", get(articles::list).post(articles::create))
        .route(
            "/articles/:id",
            get(articles::get).put(articles::update).delete(articles::delete),
        )
}

fn user_routes() -> Router<AppState> {
    use public::users;

    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", get(users::get).put(users::update).delete(users::delete))
}

fn auth_public_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(public::auth::login))
}

fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(protected::auth::me))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::in_memory(AppConfig::development()).unwrap())
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn malformed_json_is_not_acceptable() {
        let request = Request::post("/articles")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mut config = AppConfig::development();
        config.api.max_request_size_bytes = 64;
        let app = router(AppState::in_memory(config).unwrap());

        let content = "x".repeat(512);
        let (status, _) = send(app, post_json("/articles", json!({ "title": "Big one", "content": content }))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn bad_query_is_not_acceptable() {
        let request = Request::get("/articles?limit=lots").body(Body::empty()).unwrap();
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    }

    #[tokio::test]
    async fn me_requires_bearer_token() {
        let request = Request::get("/auth/me").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Missing Authorization header");
    }

    #[tokio::test]
    async fn health_is_ok_on_memory_backends() {
        let (status, body) = send(app(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
