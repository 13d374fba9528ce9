//! Upload storage: owns the lifetime of each transient resume file.
//!
//! `UploadStore::acquire` writes the bytes under `root/<uuid>_<sanitized leaf>` and hands
//! back an `UploadGuard`. The guard deletes the file on `release()` and, as a backstop,
//! on `Drop`, so a request future that is abandoned mid-flight still cleans up.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub mod filename;

use filename::sanitize_leaf;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Error saving uploaded file.")]
    StorageWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error removing uploaded file.")]
    StorageDeleteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A resume file that has been written to storage. Valid only while its guard lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedResume {
    pub original_filename: String,
    pub stored_path: PathBuf,
    pub size_bytes: u64,
    /// Lower-cased extension, as accepted by validation.
    pub extension: String,
}

/// Storage root shared by all requests. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the storage root if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), ResourceError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| ResourceError::StorageWriteFailure {
                path: self.root.clone(),
                source,
            })
    }

    /// Writes `bytes` to a fresh, collision-free path and returns the guard owning it.
    ///
    /// The declared name only contributes a sanitized leaf; the unique prefix guarantees
    /// two concurrent uploads of `resume.docx` never share a path.
    pub async fn acquire(
        &self,
        bytes: &[u8],
        declared_name: &str,
        extension: &str,
    ) -> Result<UploadGuard, ResourceError> {
        let leaf = format!("{}_{}", Uuid::new_v4().simple(), sanitize_leaf(declared_name));
        let path = self.root.join(leaf);

        if let Err(source) = write_new_file(&path, bytes).await {
            // A partial file may exist if the write failed midway.
            let _ = tokio::fs::remove_file(&path).await;
            return Err(ResourceError::StorageWriteFailure { path, source });
        }

        info!("Resume file saved to: {}", path.display());

        Ok(UploadGuard {
            resume: UploadedResume {
                original_filename: declared_name.to_string(),
                stored_path: path,
                size_bytes: bytes.len() as u64,
                extension: extension.to_string(),
            },
            released: false,
        })
    }
}

async fn write_new_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
}

/// Exclusive owner of one stored upload.
#[derive(Debug)]
pub struct UploadGuard {
    resume: UploadedResume,
    released: bool,
}

impl UploadGuard {
    pub fn resume(&self) -> &UploadedResume {
        &self.resume
    }

    pub fn path(&self) -> &Path {
        &self.resume.stored_path
    }

    /// True once cleanup has run, whether or not the delete succeeded.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Deletes the stored file. Calling it again, or on a file that is already gone, is a no-op.
    /// A failed delete is returned once and not retried.
    pub async fn release(&mut self) -> Result<(), ResourceError> {
        if self.released {
            return Ok(());
        }
        let outcome = tokio::fs::remove_file(&self.resume.stored_path).await;
        self.finish_release(outcome)
    }

    fn finish_release(&mut self, outcome: io::Result<()>) -> Result<(), ResourceError> {
        match outcome {
            Ok(()) => {
                info!(
                    "Cleaned up uploaded file: {}",
                    self.resume.stored_path.display()
                );
                self.released = true;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(
                    "Uploaded file already absent: {}",
                    self.resume.stored_path.display()
                );
                self.released = true;
                Ok(())
            }
            Err(source) => {
                // One attempt only: `Drop` must not retry or report it again.
                self.released = true;
                Err(ResourceError::StorageDeleteFailure {
                    path: self.resume.stored_path.clone(),
                    source,
                })
            }
        }
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        if self.is_released() {
            return;
        }
        let outcome = std::fs::remove_file(&self.resume.stored_path);
        if let Err(e) = self.finish_release(outcome) {
            warn!(
                "Error removing uploaded file {} on drop: {e:?}",
                e.path().display()
            );
        }
    }
}

impl ResourceError {
    pub fn path(&self) -> &Path {
        match self {
            ResourceError::StorageWriteFailure { path, .. }
            | ResourceError::StorageDeleteFailure { path, .. } => path,
        }
    }
}
