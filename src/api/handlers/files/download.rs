use crate::AppState;
use crate::api::error::AppError;
use crate::utils::validation::attachment_disposition;
use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

pub const DICOM_CONTENT_TYPE: &str = "application/dicom";

#[utoipa::path(
    get,
    path = "/api/download/{id}",
    params(
        ("id" = String, Path, description = "File record ID")
    ),
    responses(
        (status = 200, description = "application/dicom attachment stream"),
        (status = 404, description = "Record or stored bytes not found")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (record, stream) = state.dicom_service.open_download(&id).await?;

    let body = Body::from_stream(ReaderStream::new(stream.reader));

    let headers = [
        (header::CONTENT_TYPE, DICOM_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            attachment_disposition(&record.original_name),
        ),
        (header::CONTENT_LENGTH, stream.size.to_string()),
    ];

    Ok((headers, body).into_response())
}
