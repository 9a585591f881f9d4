use crate::AppState;
use crate::api::error::AppError;
use crate::services::dicom_service::DicomService;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use super::types::*;

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "No file uploaded, malformed multipart body, not a .dcm file or too large")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut uploaded = None;

    // Parts after the first `file` are never read
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();

        let body_with_io_error = field.map_err(std::io::Error::other);
        let reader = StreamReader::new(Box::pin(body_with_io_error));

        uploaded = Some(
            state
                .dicom_service
                .upload(&original_name, Box::new(reader))
                .await?,
        );
        break;
    }

    let record = uploaded.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    Ok(Json(UploadResponse {
        success: true,
        url: DicomService::public_url(&record),
        file_id: record.id,
    }))
}
