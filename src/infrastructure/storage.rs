use crate::config::AppConfig;
use crate::services::storage::{LocalStorageService, StorageService};
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &AppConfig) -> anyhow::Result<Arc<dyn StorageService>> {
    let storage = LocalStorageService::new(&config.uploads_dir)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to prepare uploads directory {}: {}",
                config.uploads_dir.display(),
                e
            )
        })?;

    info!(
        "📂 Uploads: {} (Max Size={}MB)",
        storage.root().display(),
        config.max_file_size / 1024 / 1024
    );

    Ok(Arc::new(storage))
}
