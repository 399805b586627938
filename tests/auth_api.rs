mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{body_json, get, login, post_json, spawn_app, ADMIN_EMAIL, ADMIN_PASSWORD};

#[tokio::test]
async fn login_returns_token_and_user() {
    let test = spawn_app().await;
    let response = post_json(
        &test.app,
        "/login",
        None,
        json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
    // The password hash must never leave the server.
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let test = spawn_app().await;
    let response = post_json(
        &test.app,
        "/login",
        None,
        json!({ "email": ADMIN_EMAIL, "password": "wrong" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_unknown_email_is_rejected() {
    let test = spawn_app().await;
    let response = post_json(
        &test.app,
        "/login",
        None,
        json!({ "email": "nobody@example.com", "password": ADMIN_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_current_user() {
    let test = spawn_app().await;
    let token = login(&test.app).await;

    let response = get(&test.app, "/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn gated_endpoints_reject_missing_or_bogus_tokens() {
    let test = spawn_app().await;

    let response = get(&test.app, "/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(&test.app, "/admin/updates", Some("not-a-real-token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let test = spawn_app().await;
    let token = login(&test.app).await;

    let response = post_json(&test.app, "/logout", Some(&token), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&test.app, "/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
