use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::models::{FileRecord, FileRecordPatch, NewFileRecord};
use crate::services::enhancer::Enhancer;
use crate::services::record_store::RecordStore;
use crate::services::storage::{ObjectStream, StorageError, StorageService};
use crate::utils::validation::{ValidationError, has_dicom_magic, validate_dicom_extension};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncRead;

/// Public path the uploads directory is served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Prefix given to the original name of every derived record.
pub const PROCESSED_PREFIX: &str = "processed_";

pub struct DicomService {
    records: Arc<dyn RecordStore>,
    storage: Arc<dyn StorageService>,
    enhancer: Arc<dyn Enhancer>,
    config: AppConfig,
}

fn validation_message(e: &anyhow::Error) -> String {
    e.downcast_ref::<ValidationError>()
        .map(|v| v.message.clone())
        .unwrap_or_else(|| e.to_string())
}

impl DicomService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        storage: Arc<dyn StorageService>,
        enhancer: Arc<dyn Enhancer>,
        config: AppConfig,
    ) -> Self {
        Self {
            records,
            storage,
            enhancer,
            config,
        }
    }

    /// URL under which the raw bytes of `record` are served.
    pub fn public_url(record: &FileRecord) -> String {
        format!("{}/{}", UPLOADS_ROUTE, record.stored_name)
    }

    /// Stores an uploaded payload and registers its record.
    ///
    /// The extension is checked before any byte is written; the size limit is
    /// enforced while streaming.
    pub async fn upload<'a>(
        &self,
        original_name: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<FileRecord, AppError> {
        validate_dicom_extension(original_name)
            .map_err(|e| AppError::UnsupportedMediaType(validation_message(&e)))?;

        let stored = self
            .storage
            .upload_stream(reader, self.config.max_file_size as u64)
            .await?;

        if !has_dicom_magic(&stored.leading_bytes) {
            if self.config.strict_dicom_preamble {
                self.discard(&stored.path).await;
                return Err(AppError::UnsupportedMediaType(
                    "File is not a valid DICOM file (missing DICM magic bytes)".to_string(),
                ));
            }
            tracing::warn!(
                original_name = %original_name,
                stored_name = %stored.stored_name,
                "File may not be a valid DICOM file (missing DICM magic bytes)"
            );
        }

        let created = self
            .records
            .create(NewFileRecord {
                original_name: original_name.to_string(),
                stored_name: stored.stored_name,
                stored_path: stored.path.clone(),
                byte_size: stored.size,
                processed: false,
                linked_result_id: None,
            })
            .await;

        let record = match created {
            Ok(record) => record,
            Err(e) => {
                self.discard(&stored.path).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            file_id = %record.id,
            original_name = %record.original_name,
            size_bytes = record.byte_size,
            "Upload stored"
        );

        Ok(record)
    }

    pub async fn file_info(&self, id: &str) -> Result<FileRecord, AppError> {
        self.records
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<FileRecord>, AppError> {
        Ok(self.records.list().await?)
    }

    /// Runs the enhancer over an original and registers the result.
    ///
    /// The original is only marked processed once the derived bytes are on
    /// disk and the derived record exists.
    pub async fn process(&self, id: &str) -> Result<FileRecord, AppError> {
        let original = self
            .records
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Original file not found".to_string()))?;

        let start = Instant::now();

        let input = self
            .storage
            .read(&original.stored_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read original {}: {}", id, e)))?;

        let enhanced = self.enhancer.enhance(input).await.map_err(|e| {
            AppError::Internal(format!(
                "Enhancer '{}' failed for {}: {}",
                self.enhancer.name(),
                id,
                e
            ))
        })?;

        let stored = self.storage.upload_bytes(enhanced).await.map_err(|e| {
            AppError::Internal(format!("Failed to store processed copy of {}: {}", id, e))
        })?;

        let created = self
            .records
            .create(NewFileRecord {
                original_name: format!("{}{}", PROCESSED_PREFIX, original.original_name),
                stored_name: stored.stored_name,
                stored_path: stored.path.clone(),
                byte_size: stored.size,
                processed: true,
                linked_result_id: None,
            })
            .await;

        let derived = match created {
            Ok(record) => record,
            Err(e) => {
                self.discard(&stored.path).await;
                return Err(e.into());
            }
        };

        let linked = self
            .records
            .update(&original.id, FileRecordPatch::mark_processed(derived.id.clone()))
            .await?;
        if linked.is_none() {
            tracing::warn!(
                file_id = %original.id,
                result_id = %derived.id,
                "Original record vanished before it could be linked"
            );
        }

        tracing::info!(
            file_id = %original.id,
            result_id = %derived.id,
            enhancer = self.enhancer.name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Processing complete"
        );

        Ok(derived)
    }

    /// Resolves a record and opens its bytes for streaming.
    pub async fn open_download(&self, id: &str) -> Result<(FileRecord, ObjectStream), AppError> {
        let record = self
            .records
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let stream = match self.storage.open_stream(&record.stored_path).await {
            Ok(stream) => stream,
            Err(StorageError::NotFound(path)) => {
                tracing::warn!(
                    file_id = %record.id,
                    path = %path,
                    "Record exists but its bytes are missing on disk"
                );
                return Err(AppError::NotFound("File not found on disk".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok((record, stream))
    }

    async fn discard(&self, path: &std::path::Path) {
        if let Err(e) = self.storage.delete_file(path).await {
            tracing::warn!(path = %path.display(), "Failed to clean up stored object: {}", e);
        }
    }
}
