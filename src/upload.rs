//! Ephemeral storage for uploaded documents.
//!
//! Every upload lives on disk only for the duration of its request. The store
//! hands back a [`StoredUpload`] guard that owns the file: the handler removes
//! it explicitly once the pipeline finishes, and the guard's `Drop` fallback
//! covers early returns and panics. Removing a file that is already gone is a
//! no-op rather than an error.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Errors raised while persisting an upload to ephemeral storage.
#[derive(Debug, Error)]
pub enum UploadStoreError {
    /// The upload directory could not be created.
    #[error("Failed to prepare upload directory {path}: {source}")]
    CreateDir {
        /// Directory the store attempted to create.
        path: String,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// The uploaded bytes could not be written to disk.
    #[error("Failed to persist uploaded file: {0}")]
    Write(#[source] std::io::Error),
}

/// Filesystem-backed store for request-scoped uploads.
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Open the store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, UploadStoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| UploadStoreError::CreateDir {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Write the uploaded bytes under a fresh name and return the owning guard.
    pub async fn save(&self, bytes: &[u8]) -> Result<StoredUpload, UploadStoreError> {
        let path = self.root.join(Uuid::new_v4().to_string());
        tokio::fs::write(&path, bytes)
            .await
            .map_err(UploadStoreError::Write)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Upload persisted");
        Ok(StoredUpload {
            path,
            removed: false,
        })
    }
}

/// Deletion guard for one uploaded file.
///
/// The file is removed exactly once: either through [`StoredUpload::remove`]
/// or, failing that, when the guard is dropped.
pub struct StoredUpload {
    path: PathBuf,
    removed: bool,
}

impl StoredUpload {
    /// Location of the uploaded file on ephemeral storage.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the uploaded file.
    ///
    /// Absence of the file is tolerated; any other filesystem error is logged
    /// rather than surfaced, since cleanup failures must never mask the
    /// request outcome.
    pub async fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Upload removed"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Failed to remove upload");
            }
        }
    }
}

impl Drop for StoredUpload {
    fn drop(&mut self) {
        if !self.removed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
