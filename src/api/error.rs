use crate::services::storage::StorageError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unsupported Media Type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Every rejected upload is a 400; the variants only differ in message.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::UnsupportedMediaType(_)
            | AppError::PayloadTooLarge(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) | AppError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
        } else {
            AppError::BadRequest(e.body_text())
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(path) => {
                tracing::warn!(path = %path, "Stored object not found");
                AppError::NotFound("File not found".to_string())
            }
            StorageError::TooLarge { limit } => AppError::PayloadTooLarge(format!(
                "File exceeds the maximum allowed size of {} bytes",
                limit
            )),
            StorageError::Source(e) => {
                match e
                    .into_inner()
                    .map(|inner| inner.downcast::<MultipartError>())
                {
                    Some(Ok(multipart)) => AppError::from(*multipart),
                    Some(Err(other)) => {
                        AppError::BadRequest(format!("Failed to read upload: {}", other))
                    }
                    None => AppError::BadRequest("Failed to read upload".to_string()),
                }
            }
            StorageError::Io(e) => AppError::Internal(format!("Storage I/O failure: {}", e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                "Internal Server Error".to_string()
            }
            AppError::BadRequest(msg)
            | AppError::UnsupportedMediaType(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::NotFound(msg) => msg,
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
