mod common;

use anyhow::Result;
use common::id_of;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn login_then_me_returns_the_user() -> Result<()> {
    let app = common::spawn_app().await?;
    let user = app.create_user("alice", "s3cret-pass").await?;

    let token = app.login("alice", "s3cret-pass").await?;

    let res = app.client.get(app.url("/auth/me")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await?;
    assert_eq!(me["_id"], user["_id"]);
    assert_eq!(me["username"], "alice");
    assert!(me.get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn login_reports_expiry() -> Result<()> {
    let app = common::spawn_app().await?;
    app.create_user("alice", "s3cret-pass").await?;

    let body: Value = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "username": "alice", "password": "s3cret-pass" }))
        .send()
        .await?
        .json()
        .await?;
    assert!(body["token"].is_string());
    assert_eq!(body["expires_in"], 24 * 3600);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() -> Result<()> {
    let app = common::spawn_app().await?;
    app.create_user("alice", "s3cret-pass").await?;

    let mut messages = Vec::new();
    for (username, password) in [("alice", "wrong-pass"), ("mallory", "s3cret-pass")] {
        let res = app
            .client
            .post(app.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        messages.push(res.json::<Value>().await?["message"].clone());
    }
    assert_eq!(messages[0], messages[1]);
    Ok(())
}

#[tokio::test]
async fn login_without_fields_is_not_acceptable() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.client.post(app.url("/auth/login")).json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);
    Ok(())
}

#[tokio::test]
async fn me_rejects_missing_and_forged_tokens() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.client.get(app.url("/auth/me")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.client.get(app.url("/auth/me")).bearer_auth("not.a.token").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn token_of_deleted_user_is_rejected() -> Result<()> {
    let app = common::spawn_app().await?;
    let user = app.create_user("alice", "s3cret-pass").await?;
    let token = app.login("alice", "s3cret-pass").await?;

    app.client.delete(app.url(&format!("/users/{}", id_of(&user)?))).send().await?;

    let res = app.client.get(app.url("/auth/me")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
