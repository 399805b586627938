#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use portfolio_api::state::AppState;
use portfolio_api::storage::Storage;
use portfolio_api::{db, handlers};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub app: Router,
    pub storage_root: PathBuf,
    _storage_dir: TempDir,
}

/// Build the real router against an in-memory database and a throwaway
/// storage root, with one seeded admin user.
pub async fn spawn_app() -> TestApp {
    let db = db::establish_connection(":memory:").unwrap();
    db::seed_admin(&db, "Test Admin", ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    let storage = Storage::new(dir.path());
    storage.ensure_layout().await.unwrap();

    TestApp {
        app: handlers::router(AppState { db, storage }),
        storage_root: dir.path().to_path_buf(),
        _storage_dir: dir,
    }
}

impl TestApp {
    /// Resolve a public `/storage/...` path to its location on disk.
    pub fn disk_path(&self, public_path: &str) -> PathBuf {
        let rel = public_path
            .strip_prefix("/storage/")
            .unwrap_or_else(|| panic!("unexpected public path: {public_path}"));
        self.storage_root.join(rel)
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response {
    let request = builder(Method::GET, uri, token).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response {
    let request = builder(Method::POST, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn put_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response {
    let request = builder(Method::PUT, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> Response {
    let request = builder(Method::DELETE, uri, token)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in as the seeded admin and return the bearer token.
pub async fn login(app: &Router) -> String {
    let response = post_json(
        app,
        "/login",
        None,
        json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["token"].as_str().unwrap().to_string()
}

/// Hand-rolled multipart/form-data body builder.
pub struct MultipartForm {
    boundary: &'static str,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        MultipartForm {
            boundary: "test-boundary-7MA4YWxkTrZu0gW",
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn into_body(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

pub async fn send_multipart(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    form: MultipartForm,
) -> Response {
    let content_type = form.content_type();
    let request = builder(method, uri, token)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(form.into_body()))
        .unwrap();
    send(app, request).await
}
