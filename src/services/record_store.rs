use crate::models::{FileRecord, FileRecordPatch, NewFileRecord};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Metadata store for `FileRecord`s.
///
/// Each call is atomic on its own; there are no multi-record transactions and
/// concurrent updates to one id are last-write-wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Assigns `id` and `uploaded_at`, stores and returns the full record.
    async fn create(&self, record: NewFileRecord) -> Result<FileRecord>;

    async fn get(&self, id: &str) -> Result<Option<FileRecord>>;

    /// Merges `patch` into the record; `None` when the id is unknown.
    async fn update(&self, id: &str, patch: FileRecordPatch) -> Result<Option<FileRecord>>;

    /// `true` when a record existed and was removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<FileRecord>>;
}

/// Volatile store; contents are lost when the process exits.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, FileRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, new: NewFileRecord) -> Result<FileRecord> {
        let mut records = self.records.write().await;

        let mut id = Uuid::new_v4().to_string();
        while records.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }

        let record = FileRecord {
            id: id.clone(),
            original_name: new.original_name,
            stored_name: new.stored_name,
            stored_path: new.stored_path,
            byte_size: new.byte_size,
            uploaded_at: Utc::now(),
            processed: new.processed,
            linked_result_id: new.linked_result_id,
        };
        records.insert(id, record.clone());

        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<FileRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn update(&self, id: &str, patch: FileRecordPatch) -> Result<Option<FileRecord>> {
        let mut records = self.records.write().await;
        Ok(records.get_mut(id).map(|record| {
            patch.apply(record);
            record.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.records.write().await.remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        let mut all: Vec<FileRecord> = self.records.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(all)
    }
}
