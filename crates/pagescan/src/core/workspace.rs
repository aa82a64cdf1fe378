//! Per-job scratch directories.
//!
//! A [`Workspace`] is `<root>/<job uuid>`, created empty and owned by exactly one
//! job. [`Workspace::release`] removes it and is awaited by the orchestrator on
//! every exit path. If a workspace is dropped without being released (the job
//! future was cancelled), `Drop` removes the directory synchronously.

use crate::{PageScanError, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const SOURCE_FILE_NAME: &str = "source.pdf";

#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    released: bool,
}

impl Workspace {
    /// Create `<root>/<job_id>`.
    ///
    /// # Errors
    ///
    /// `PageScanError::Workspace` if the directory cannot be created or already
    /// exists.
    pub async fn acquire(root: &Path, job_id: Uuid) -> Result<Self> {
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            PageScanError::workspace_with_source(
                format!("Failed to create workspace root {}", root.display()),
                e,
            )
        })?;

        let path = root.join(job_id.to_string());
        // create_dir (not create_dir_all) so a colliding id fails instead of sharing.
        tokio::fs::create_dir(&path).await.map_err(|e| {
            PageScanError::workspace_with_source(format!("Failed to create workspace {}", path.display()), e)
        })?;

        tracing::debug!(job_id = %job_id, path = %path.display(), "Workspace acquired");

        Ok(Self { path, released: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the source document into the workspace.
    pub async fn persist_document(&self, bytes: &[u8]) -> Result<PathBuf> {
        let target = self.path.join(SOURCE_FILE_NAME);
        tokio::fs::write(&target, bytes).await.map_err(|e| {
            PageScanError::workspace_with_source(format!("Failed to write {}", target.display()), e)
        })?;
        Ok(target)
    }

    /// Where the image for `page_number` will be written.
    pub fn page_image_path(&self, page_number: usize) -> PathBuf {
        self.path.join(format!("page-{}.png", page_number))
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Remove the workspace and everything in it.
    ///
    /// Idempotent. Failures are logged and never returned, so cleanup cannot
    /// replace the job's own result.
    pub async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Workspace released"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove workspace"),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = std::fs::remove_dir_all(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove abandoned workspace");
        }
    }
}
