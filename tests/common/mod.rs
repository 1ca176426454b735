//! Test utilities and common setup.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use lanshare::clipboard::ChannelSink;
use lanshare::{server, AppState, ClipboardStore, Config};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use tower::ServiceExt;

pub const BOUNDARY: &str = "lanshare-test-boundary";

/// A fresh server context over a temporary directory.
pub struct TestContext {
    pub dir: TempDir,
    pub state: AppState,
    pub clipboard_updates: UnboundedReceiver<String>,
}

impl TestContext {
    pub fn shared_path(&self, name: &str) -> std::path::PathBuf {
        self.state.repository.root().join(name)
    }
}

pub fn test_config(dir: &TempDir) -> Config {
    Config {
        staging_dir: Some(dir.path().join("staging")),
        shutdown_grace_secs: 1,
        ..Config::default()
    }
}

pub async fn test_context() -> TestContext {
    test_context_with(|_| {}).await
}

/// Like [`test_context`], with the config adjusted first.
pub async fn test_context_with(configure: impl FnOnce(&mut Config)) -> TestContext {
    let dir = TempDir::new().expect("create temp dir");
    let mut config = test_config(&dir);
    configure(&mut config);

    let (sink, clipboard_updates) = ChannelSink::new();
    let state = AppState::with_config(
        dir.path().join("shared"),
        config,
        ClipboardStore::new(Arc::new(sink)),
    );
    state
        .repository
        .ensure_exists()
        .await
        .expect("create shared dir");

    TestContext {
        dir,
        state,
        clipboard_updates,
    }
}

pub async fn test_app() -> (Router, TestContext) {
    let ctx = test_context().await;
    (server::app(ctx.state.clone()), ctx)
}

/// Encode a single multipart field.
pub fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match filename {
        Some(filename) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                field, filename
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field).as_bytes(),
        ),
    }
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .uri("/upload")
        .method(Method::POST)
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(multipart_body("file", Some(filename), content)))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::GET)
        .body(Body::empty())
        .unwrap()
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::POST)
        .body(Body::empty())
        .unwrap()
}

pub fn clipboard_request(form: &str) -> Request<Body> {
    Request::builder()
        .uri("/clipboard")
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn listing(app: &Router) -> Vec<String> {
    let response = send(app, get("/api/files")).await;
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
