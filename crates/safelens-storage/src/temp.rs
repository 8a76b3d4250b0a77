use crate::error::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const TEMP_FILE_EXTENSION: &str = "jpg";

/// Directory holding in-flight uploads
#[derive(Clone, Debug)]
pub struct TempFileStore {
    base_path: PathBuf,
}

impl TempFileStore {
    /// Create the store, making sure the directory exists.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create upload directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write `data` to a fresh file with a random name.
    ///
    /// The file is opened with `create_new`, so an existing file is never
    /// overwritten. A partially written file is removed before the error is
    /// returned.
    pub async fn create(&self, data: &[u8]) -> StorageResult<TemporaryFile> {
        let path = self
            .base_path
            .join(format!("{}.{}", Uuid::new_v4(), TEMP_FILE_EXTENSION));
        let start = std::time::Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        // From here on the guard owns the file and cleans it up on error.
        let temp = TemporaryFile::new(path);

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to write file {}: {}",
                temp.path().display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to sync file {}: {}",
                temp.path().display(),
                e
            ))
        })?;

        tracing::debug!(
            temp_file = %temp.path().display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Temporary upload written"
        );

        Ok(temp)
    }
}

/// A file that exists for the duration of one request.
///
/// Call [`TemporaryFile::remove`] once the file is no longer needed. If the
/// guard is dropped first (early return, panic, cancelled task) the file is
/// removed synchronously in `Drop`.
#[derive(Debug)]
pub struct TemporaryFile {
    path: PathBuf,
    removed: bool,
}

impl TemporaryFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Delete the file. Calling this more than once is a no-op.
    pub async fn remove(&mut self) -> StorageResult<()> {
        if self.removed {
            return Ok(());
        }

        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    self.path.display(),
                    e
                )))
            }
        }

        self.removed = true;
        tracing::debug!(temp_file = %self.path.display(), "Temporary upload removed");
        Ok(())
    }
}

impl Drop for TemporaryFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(
                    temp_file = %self.path.display(),
                    "Temporary upload removed on drop"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    temp_file = %self.path.display(),
                    error = %e,
                    "Failed to remove temporary upload"
                );
            }
        }
    }
}
