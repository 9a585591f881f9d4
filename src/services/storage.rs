use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Instant;
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

/// Extension given to every stored object.
pub const DICOM_EXTENSION: &str = "dcm";

/// Leading bytes kept from each upload: the 128 byte preamble plus the 4 byte marker.
pub const LEADING_BYTES_LEN: usize = 132;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Payload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    /// The incoming payload failed before it was fully read.
    #[error("Upload stream error: {0}")]
    Source(std::io::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// An object freshly written to storage.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub stored_name: String,
    pub path: PathBuf,
    pub size: u64,
    /// Up to `LEADING_BYTES_LEN` bytes from the start of the payload.
    pub leading_bytes: Vec<u8>,
}

pub struct ObjectStream {
    pub reader: Pin<Box<dyn AsyncRead + Send>>,
    pub size: u64,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Directory served under the public uploads path.
    fn root(&self) -> &Path;

    /// Streams `reader` into a new `<uuid>.dcm` object, failing with
    /// `TooLarge` once more than `max_size` bytes arrive. Partial objects are removed.
    async fn upload_stream<'a>(
        &self,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
        max_size: u64,
    ) -> StorageResult<StoredObject>;

    /// Writes `data` into a new `<uuid>.dcm` object.
    async fn upload_bytes(&self, data: Bytes) -> StorageResult<StoredObject>;

    async fn read(&self, path: &Path) -> StorageResult<Bytes>;

    async fn open_stream(&self, path: &Path) -> StorageResult<ObjectStream>;

    async fn file_exists(&self, path: &Path) -> bool;

    async fn delete_file(&self, path: &Path) -> StorageResult<()>;
}

/// Local filesystem storage rooted at the uploads directory.
#[derive(Debug, Clone)]
pub struct LocalStorageService {
    root: PathBuf,
}

impl LocalStorageService {
    /// Creates the directory if needed and resolves it to an absolute path.
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        let root = fs::canonicalize(&root).await?;

        tracing::info!("💾 Local storage: {}", root.display());
        Ok(Self { root })
    }

    fn new_object_path(&self) -> (String, PathBuf) {
        let stored_name = format!("{}.{}", Uuid::new_v4(), DICOM_EXTENSION);
        let path = self.root.join(&stored_name);
        (stored_name, path)
    }

    async fn write_stream<'a>(
        path: &Path,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
        max_size: u64,
    ) -> StorageResult<(u64, Vec<u8>)> {
        let mut file = fs::File::create(path).await?;
        let mut buffer = vec![0u8; 64 * 1024];
        let mut leading = Vec::with_capacity(LEADING_BYTES_LEN);
        let mut total: u64 = 0;

        loop {
            let n = reader.read(&mut buffer).await.map_err(StorageError::Source)?;
            if n == 0 {
                break;
            }
            total += n as u64;
            if total > max_size {
                return Err(StorageError::TooLarge { limit: max_size });
            }
            if leading.len() < LEADING_BYTES_LEN {
                let take = (LEADING_BYTES_LEN - leading.len()).min(n);
                leading.extend_from_slice(&buffer[..take]);
            }
            file.write_all(&buffer[..n]).await?;
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok((total, leading))
    }

    async fn discard(path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), "Failed to remove partial object: {}", e);
            }
        }
    }
}

fn not_found_or_io(path: &Path, e: std::io::Error) -> StorageError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(path.display().to_string())
    } else {
        StorageError::Io(e)
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn upload_stream<'a>(
        &self,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
        max_size: u64,
    ) -> StorageResult<StoredObject> {
        let (stored_name, path) = self.new_object_path();
        let start = Instant::now();

        match Self::write_stream(&path, reader, max_size).await {
            Ok((size, leading_bytes)) => {
                tracing::info!(
                    path = %path.display(),
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage upload successful"
                );
                Ok(StoredObject {
                    stored_name,
                    path,
                    size,
                    leading_bytes,
                })
            }
            Err(e) => {
                Self::discard(&path).await;
                Err(e)
            }
        }
    }

    async fn upload_bytes(&self, data: Bytes) -> StorageResult<StoredObject> {
        let (stored_name, path) = self.new_object_path();
        let size = data.len() as u64;
        let leading_bytes = data[..data.len().min(LEADING_BYTES_LEN)].to_vec();

        let write = async {
            let mut file = fs::File::create(&path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            Ok::<_, std::io::Error>(())
        };

        if let Err(e) = write.await {
            Self::discard(&path).await;
            return Err(e.into());
        }

        Ok(StoredObject {
            stored_name,
            path,
            size,
            leading_bytes,
        })
    }

    async fn read(&self, path: &Path) -> StorageResult<Bytes> {
        let data = fs::read(path).await.map_err(|e| not_found_or_io(path, e))?;
        Ok(Bytes::from(data))
    }

    async fn open_stream(&self, path: &Path) -> StorageResult<ObjectStream> {
        let file = fs::File::open(path)
            .await
            .map_err(|e| not_found_or_io(path, e))?;
        let size = file.metadata().await?.len();

        Ok(ObjectStream {
            reader: Box::pin(file),
            size,
        })
    }

    async fn file_exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn delete_file(&self, path: &Path) -> StorageResult<()> {
        fs::remove_file(path)
            .await
            .map_err(|e| not_found_or_io(path, e))
    }
}
