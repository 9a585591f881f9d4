use crate::models::FileRecord;
use crate::services::dicom_service::DicomService;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_id: String,
    pub url: String,
}

/// Public projection of a `FileRecord`.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileInfoResponse {
    pub id: String,
    pub original_name: String,
    pub url: String,
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&FileRecord> for FileInfoResponse {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            original_name: record.original_name.clone(),
            url: DicomService::public_url(record),
            file_size: record.byte_size,
            uploaded_at: record.uploaded_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileInfoResponse>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub result_id: String,
    pub url: String,
}

/// Multipart body accepted by the upload endpoint.
#[derive(ToSchema)]
pub struct UploadForm {
    /// DICOM file, `.dcm` extension required
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
