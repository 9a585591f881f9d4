mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use tower::ServiceExt;

#[tokio::test]
async fn test_upload_info_process_download_flow() {
    let t = setup_app().await;
    let payload = b"0123456789".to_vec();

    // 1. Upload
    let response = t
        .app
        .clone()
        .oneshot(upload_request("a.dcm", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    let file_id = json["fileId"].as_str().unwrap().to_string();
    let url = json["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".dcm"));

    let record = t.state.records.get(&file_id).await.unwrap().unwrap();
    assert_eq!(url, format!("/uploads/{}", record.stored_name));

    // 2. File info
    let response = t
        .app
        .clone()
        .oneshot(get(&format!("/api/file/{}", file_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let info = body_json(response).await;
    assert_eq!(info["id"], file_id.as_str());
    assert_eq!(info["originalName"], "a.dcm");
    assert_eq!(info["url"], url.as_str());
    assert_eq!(info["fileSize"], 10);
    assert!(info["uploadedAt"].as_str().is_some());

    // 3. Process
    let response = t
        .app
        .clone()
        .oneshot(post(&format!("/api/process/{}", file_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let processed = body_json(response).await;
    assert_eq!(processed["success"], true);
    let result_id = processed["resultId"].as_str().unwrap().to_string();
    assert_ne!(result_id, file_id);
    assert_ne!(processed["url"], url.as_str());

    // 4. Download the derived file
    let response = t
        .app
        .clone()
        .oneshot(get(&format!("/api/download/{}", result_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, payload);
}

#[tokio::test]
async fn test_upload_size_matches_payload() {
    let t = setup_app().await;

    for size in [0usize, 1, 131, 132, 4096, 200_000] {
        let payload = vec![0x42u8; size];
        let response = t
            .app
            .clone()
            .oneshot(upload_request("scan.dcm", &payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "size {}", size);
        let file_id = body_json(response).await["fileId"]
            .as_str()
            .unwrap()
            .to_string();

        let info = body_json(
            t.app
                .clone()
                .oneshot(get(&format!("/api/file/{}", file_id)))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(info["fileSize"], size as u64);
    }
}

#[tokio::test]
async fn test_extension_check_is_case_insensitive() {
    let t = setup_app().await;

    for name in ["UPPER.DCM", "mixed.DcM", "multi.part.name.dcm"] {
        let response = t
            .app
            .clone()
            .oneshot(upload_request(name, &dicom_bytes(8)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", name);
    }
    assert_eq!(t.state.records.list().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_non_dicom_extension_is_rejected() {
    let t = setup_app().await;

    for name in ["b.txt", "scan.dcm.png", "noextension", "dicom.dcmx"] {
        let response = t
            .app
            .clone()
            .oneshot(upload_request(name, &dicom_bytes(8)))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "{}",
            name
        );
        let json = body_json(response).await;
        assert_eq!(json["error"], "Only DICOM (.dcm) files are allowed");
    }

    assert!(t.state.records.list().await.unwrap().is_empty());
    let mut entries = tokio::fs::read_dir(t.state.storage.root()).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let t = setup_app_with(|config| config.max_file_size = 1024).await;

    let response = t
        .app
        .clone()
        .oneshot(upload_request("big.dcm", &dicom_bytes(1024)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "File exceeds the maximum allowed size of 1024 bytes"
    );

    assert!(t.state.records.list().await.unwrap().is_empty());
    let mut entries = tokio::fs::read_dir(t.state.storage.root()).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());

    // Exactly at the limit is fine
    let response = t
        .app
        .clone()
        .oneshot(upload_request("fits.dcm", &dicom_bytes(1024 - 132)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let t = setup_app().await;

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body("attachment", "a.dcm", b"data")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No file uploaded");
    assert!(t.state.records.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_requires_multipart_body() {
    let t = setup_app().await;

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"file": "a.dcm"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_missing_magic_bytes_only_warns() {
    let t = setup_app().await;

    let response = t
        .app
        .clone()
        .oneshot(upload_request("plain.dcm", b"not really dicom"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_strict_preamble_rejects_missing_magic_bytes() {
    let t = setup_app_with(|config| config.strict_dicom_preamble = true).await;

    let response = t
        .app
        .clone()
        .oneshot(upload_request("plain.dcm", b"not really dicom"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(t.state.records.list().await.unwrap().is_empty());

    let response = t
        .app
        .clone()
        .oneshot(upload_request("real.dcm", &dicom_bytes(64)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_uploaded_bytes_are_served_statically() {
    let t = setup_app().await;
    let payload = dicom_bytes(256);

    let response = t
        .app
        .clone()
        .oneshot(upload_request("static.dcm", &payload))
        .await
        .unwrap();
    let url = body_json(response).await["url"]
        .as_str()
        .unwrap()
        .to_string();

    let response = t.app.clone().oneshot(get(&url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, payload);

    let response = t
        .app
        .clone()
        .oneshot(get("/uploads/does-not-exist.dcm"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_file_info_unknown_id() {
    let t = setup_app().await;

    let response = t
        .app
        .clone()
        .oneshot(get("/api/file/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "File not found");
}

fn raw_upload(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn part_header(field: &str, filename: Option<&str>) -> Vec<u8> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };
    format!("--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\n\r\n").into_bytes()
}

async fn stored_file_count(t: &TestApp) -> usize {
    let mut entries = tokio::fs::read_dir(t.state.storage.root()).await.unwrap();
    let mut count = 0;
    while entries.next_entry().await.unwrap().is_some() {
        count += 1;
    }
    count
}

#[tokio::test]
async fn test_parts_after_the_file_do_not_orphan_the_upload() {
    let t = setup_app().await;
    let payload = dicom_bytes(32);

    let mut body = part_header("file", Some("a.dcm"));
    body.extend_from_slice(&payload);
    body.extend_from_slice(b"\r\n");
    body.extend(part_header("note", None));
    // Second part never reaches a closing boundary
    body.extend_from_slice(b"truncated note");

    let response = t.app.clone().oneshot(raw_upload(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let file_id = body_json(response).await["fileId"]
        .as_str()
        .unwrap()
        .to_string();

    let records = t.state.records.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, file_id);
    assert_eq!(stored_file_count(&t).await, 1);

    let stored = tokio::fs::read(&records[0].stored_path).await.unwrap();
    assert_eq!(stored, payload);
}

#[tokio::test]
async fn test_truncated_file_part_is_a_bad_request() {
    let t = setup_app().await;

    let mut body = part_header("file", Some("a.dcm"));
    body.extend_from_slice(&dicom_bytes(64));
    // No closing boundary

    let response = t.app.clone().oneshot(raw_upload(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert_ne!(json["error"], "Internal Server Error");

    assert!(t.state.records.list().await.unwrap().is_empty());
    assert_eq!(stored_file_count(&t).await, 0);
}

#[tokio::test]
async fn test_body_over_transport_limit_is_reported_as_too_large() {
    let t = setup_app_with(|config| config.max_file_size = 1024).await;

    let mut body = part_header("note", None);
    body.extend(std::iter::repeat_n(b'n', 2 * 1024 * 1024));
    body.extend_from_slice(b"\r\n");
    body.extend(part_header("file", Some("a.dcm")));
    body.extend_from_slice(&dicom_bytes(16));
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let response = t.app.clone().oneshot(raw_upload(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Request body exceeds the maximum allowed limit"
    );

    assert!(t.state.records.list().await.unwrap().is_empty());
    assert_eq!(stored_file_count(&t).await, 0);
}
