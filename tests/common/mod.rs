#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use dicom_insight_backend::config::AppConfig;
use dicom_insight_backend::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;

pub const BOUNDARY: &str = "---------------------------dicominsight0123456789";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    _dir: TempDir,
}

pub async fn setup_app() -> TestApp {
    setup_app_with(|_| {}).await
}

pub async fn setup_app_with(customize: impl FnOnce(&mut AppConfig)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::ephemeral(dir.path().join("uploads"));
    customize(&mut config);

    let state = AppState::from_config(config).await.unwrap();
    let app = create_app(state.clone());

    TestApp {
        app,
        state,
        _dir: dir,
    }
}

/// 128 byte preamble, `DICM`, then `extra` filler bytes.
pub fn dicom_bytes(extra: usize) -> Vec<u8> {
    let mut data = vec![0u8; 128];
    data.extend_from_slice(b"DICM");
    data.extend(std::iter::repeat_n(0xAB, extra));
    data
}

pub fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
            Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
            Content-Type: application/dicom\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body("file", filename, content)))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = body_bytes(response).await;
    serde_json::from_slice(&body).unwrap_or_else(|e| {
        panic!(
            "Response is not JSON ({}): {:?}",
            e,
            String::from_utf8_lossy(&body)
        )
    })
}
