use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One stored DICOM artifact and its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    /// Client supplied filename, kept verbatim for download headers.
    pub original_name: String,
    /// `<uuid>.dcm`, generated by storage.
    pub stored_name: String,
    pub stored_path: PathBuf,
    pub byte_size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub processed: bool,
    /// Set on an original once processing produced a derived record.
    pub linked_result_id: Option<String>,
}

/// Fields supplied by callers when creating a record; the store assigns the rest.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub original_name: String,
    pub stored_name: String,
    pub stored_path: PathBuf,
    pub byte_size: u64,
    pub processed: bool,
    pub linked_result_id: Option<String>,
}

/// Partial update over the mutable fields of a `FileRecord`.
///
/// `linked_result_id` is doubly optional: `None` leaves the link untouched,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct FileRecordPatch {
    pub processed: Option<bool>,
    pub linked_result_id: Option<Option<String>>,
}

impl FileRecordPatch {
    /// Patch applied to an original once its derived copy exists.
    pub fn mark_processed(result_id: impl Into<String>) -> Self {
        Self {
            processed: Some(true),
            linked_result_id: Some(Some(result_id.into())),
        }
    }

    pub fn apply(self, record: &mut FileRecord) {
        if let Some(processed) = self.processed {
            record.processed = processed;
        }
        if let Some(link) = self.linked_result_id {
            record.linked_result_id = link;
        }
    }
}
