#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use docstore_api::cache::MemoryCache;
use docstore_api::config::AppConfig;
use docstore_api::database::MemoryDocumentStore;
use docstore_api::models::{Article, User};
use docstore_api::services::Resource;
use docstore_api::{router, AppState};
use serde_json::{json, Value};

/// One in-process server per test, on memory backends.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    /// Shared with the server so tests can inspect or plant entries.
    pub cache: Arc<MemoryCache>,
}

pub async fn spawn_app() -> Result<TestApp> {
    spawn_app_with(AppConfig::development()).await
}

pub async fn spawn_app_with(config: AppConfig) -> Result<TestApp> {
    let cache = Arc::new(MemoryCache::new());
    let state = AppState::from_parts(
        config,
        Arc::new(MemoryDocumentStore::new(Article::COLLECTION)),
        Arc::new(MemoryDocumentStore::new(User::COLLECTION)),
        cache.clone(),
    )?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.ok();
    });

    Ok(TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        cache,
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn create_article(&self, title: &str, content: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/articles"))
            .json(&json!({ "title": title, "content": content }))
            .send()
            .await?;
        anyhow::ensure!(res.status().is_success(), "create article failed: {}", res.status());
        Ok(res.json().await?)
    }

    pub async fn create_user(&self, username: &str, password: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/users"))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "first_name": "Test",
                "last_name": "User",
                "password": password,
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status().is_success(), "create user failed: {}", res.status());
        Ok(res.json().await?)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status().is_success(), "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }
}

pub fn id_of(doc: &Value) -> Result<String> {
    doc["_id"].as_str().map(str::to_string).context("document has no _id")
}
