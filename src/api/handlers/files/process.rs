use crate::AppState;
use crate::api::error::AppError;
use crate::services::dicom_service::DicomService;
use axum::{
    Json,
    extract::{Path, State},
};

use super::types::*;

#[utoipa::path(
    post,
    path = "/api/process/{file_id}",
    params(
        ("file_id" = String, Path, description = "ID of the original file")
    ),
    responses(
        (status = 200, description = "Enhanced copy created", body = ProcessResponse),
        (status = 404, description = "Original file not found"),
        (status = 500, description = "Enhanced copy could not be written")
    ),
    tag = "files"
)]
pub async fn process_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<ProcessResponse>, AppError> {
    let derived = state.dicom_service.process(&file_id).await?;

    Ok(Json(ProcessResponse {
        success: true,
        url: DicomService::public_url(&derived),
        result_id: derived.id,
    }))
}
