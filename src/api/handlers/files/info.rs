use crate::AppState;
use crate::api::error::AppError;
use axum::{
    Json,
    extract::{Path, State},
};

use super::types::*;

#[utoipa::path(
    get,
    path = "/api/file/{id}",
    params(
        ("id" = String, Path, description = "File record ID")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileInfoResponse),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn get_file_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileInfoResponse>, AppError> {
    let record = state.dicom_service.file_info(&id).await?;
    Ok(Json(FileInfoResponse::from(&record)))
}

#[utoipa::path(
    get,
    path = "/api/files",
    responses(
        (status = 200, description = "All stored files, newest first", body = FileListResponse)
    ),
    tag = "files"
)]
pub async fn list_files(State(state): State<AppState>) -> Result<Json<FileListResponse>, AppError> {
    let records = state.dicom_service.list().await?;
    Ok(Json(FileListResponse {
        files: records.iter().map(FileInfoResponse::from).collect(),
    }))
}
