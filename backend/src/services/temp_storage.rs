//! Temporary storage for uploaded track files.
//!
//! Uploads are written to disk for the duration of one request and removed
//! once they have been parsed. Removal is best-effort: it runs in a
//! background task and failures only show up in the logs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Directory used when none is configured.
pub const DEFAULT_TEMP_DIR: &str = "./tempFiles/";

/// An upload persisted in temporary storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Client-supplied file name, used in logs and error messages.
    pub name: String,
    /// Location of the stored bytes.
    pub path: PathBuf,
}

/// Capability to hold request-scoped upload bytes.
#[async_trait]
pub trait TempStorage: Send + Sync {
    /// Store `bytes` for the upload called `name`.
    async fn store(&self, name: &str, bytes: &[u8]) -> std::io::Result<StoredUpload>;

    /// Read back a stored upload.
    async fn read(&self, upload: &StoredUpload) -> std::io::Result<Vec<u8>>;

    /// Remove a stored upload.
    async fn delete(&self, upload: &StoredUpload) -> std::io::Result<()>;
}

/// Filesystem-backed temporary storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct FsTempStorage {
    dir: PathBuf,
}

impl FsTempStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the storage directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }
}

impl Default for FsTempStorage {
    fn default() -> Self {
        Self::new(DEFAULT_TEMP_DIR)
    }
}

#[async_trait]
impl TempStorage for FsTempStorage {
    async fn store(&self, name: &str, bytes: &[u8]) -> std::io::Result<StoredUpload> {
        self.ensure_dir().await?;
        // Concurrent requests may upload files with the same name.
        let file_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(name));
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;

        Ok(StoredUpload {
            name: name.to_string(),
            path,
        })
    }

    async fn read(&self, upload: &StoredUpload) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&upload.path).await
    }

    async fn delete(&self, upload: &StoredUpload) -> std::io::Result<()> {
        tokio::fs::remove_file(&upload.path).await
    }
}

/// Strip any directory components from a client-supplied file name.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Outcome of a cleanup task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: usize,
    pub failed: usize,
}

/// Delete uploads in the background.
///
/// Each deletion runs in its own task so that a panic inside a storage
/// implementation is caught and logged like any other failure. The returned
/// handle never yields an error and may be dropped.
pub fn spawn_cleanup(
    storage: Arc<dyn TempStorage>,
    uploads: Vec<StoredUpload>,
) -> JoinHandle<CleanupReport> {
    tokio::spawn(async move {
        let mut report = CleanupReport::default();

        for upload in uploads {
            let path = upload.path.clone();
            let storage = Arc::clone(&storage);
            let outcome = tokio::spawn(async move { storage.delete(&upload).await }).await;

            match outcome {
                Ok(Ok(())) => {
                    debug!(path = %path.display(), "deleted temp file");
                    report.deleted += 1;
                }
                Ok(Err(e)) => {
                    warn!(path = %path.display(), error = %e, "failed to delete temp file");
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "temp file cleanup task aborted");
                    report.failed += 1;
                }
            }
        }

        report
    })
}
