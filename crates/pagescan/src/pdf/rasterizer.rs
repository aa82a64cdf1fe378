//! Page rasterization.
//!
//! A [`PageRasterizer`] turns one page of the persisted document into a PNG at
//! the path the [`PageTask`] names. The default adapter shells out to poppler's
//! `pdftoppm`, one invocation per page:
//!
//! ```text
//! pdftoppm -f <n> -l <n> -r <dpi> -png -singlefile <document> <workspace>/page-<n>
//! ```
//!
//! `<dpi>` is the configured density, lowered for pages whose long edge would
//! otherwise exceed `max_image_dimension` pixels.

use super::dpi::calculate_optimal_dpi;
use super::error::PdfError;
use super::page_count::page_sizes;
use crate::core::config::RasterConfig;
use crate::types::{PageSize, PageTask};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Converts PDF pages into images inside the job workspace.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    fn name(&self) -> &str;

    /// Number of pages in the document.
    async fn count_pages(&self, document: Arc<[u8]>) -> Result<usize, PdfError> {
        Ok(self.page_sizes(document).await?.len())
    }

    /// Size of every page in page order; the length is the page count.
    ///
    /// The default parses the bytes with `lopdf` on the blocking pool.
    async fn page_sizes(&self, document: Arc<[u8]>) -> Result<Vec<Option<PageSize>>, PdfError> {
        tokio::task::spawn_blocking(move || page_sizes(&document))
            .await
            .map_err(|e| PdfError::InvalidPdf(format!("page counting task failed: {}", e)))?
    }

    /// Render `task.page_number` of `task.document_path` to `task.image_path`.
    ///
    /// Must not return `Ok` unless the image exists at the returned path.
    async fn rasterize(&self, task: &PageTask) -> Result<PathBuf, PdfError>;
}

pub struct PdftoppmRasterizer {
    binary: String,
    dpi: i32,
    max_image_dimension: i32,
    page_timeout: Duration,
}

impl PdftoppmRasterizer {
    /// Rasterizer with the default `max_image_dimension`.
    pub fn new(binary: impl Into<String>, dpi: i32, page_timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            dpi,
            max_image_dimension: RasterConfig::default().max_image_dimension,
            page_timeout,
        }
    }

    pub fn with_max_image_dimension(mut self, max_image_dimension: i32) -> Self {
        self.max_image_dimension = max_image_dimension;
        self
    }

    pub fn from_config(config: &RasterConfig) -> Self {
        Self::new(
            config.pdftoppm_path.clone(),
            config.dpi,
            Duration::from_millis(config.page_timeout_ms),
        )
        .with_max_image_dimension(config.max_image_dimension)
    }

    /// Density for a page of `size`. Unknown sizes keep the configured DPI.
    fn density_for(&self, size: Option<PageSize>) -> i32 {
        match size {
            Some(size) => calculate_optimal_dpi(size.width, size.height, self.dpi, self.max_image_dimension),
            None => self.dpi,
        }
    }

    /// Whether `pdftoppm -v` runs. Poppler prints its version on stderr and
    /// exits 0 or 99 depending on the release, so only spawning is checked.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-v")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .is_ok()
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::from_config(&RasterConfig::default())
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    async fn rasterize(&self, task: &PageTask) -> Result<PathBuf, PdfError> {
        let page = task.page_number.to_string();
        let density = self.density_for(task.page_size);
        if density != self.dpi {
            tracing::debug!(page = task.page_number, dpi = density, "Lowered density for oversized page");
        }
        // -singlefile appends the extension itself.
        let output_root = task.image_path.with_extension("");

        let child = Command::new(&self.binary)
            .args(["-f", page.as_str(), "-l", page.as_str()])
            .arg("-r")
            .arg(density.to_string())
            .arg("-png")
            .arg("-singlefile")
            .arg(task.document_path.as_path())
            .arg(&output_root)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    PdfError::ToolUnavailable(format!("'{}' not found on PATH", self.binary))
                }
                _ => PdfError::IOError(format!("Failed to start '{}': {}", self.binary, e)),
            })?;

        let output = match timeout(self.page_timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(PdfError::IOError(format!("Failed to wait for pdftoppm: {}", e))),
            Err(_) => return Err(PdfError::Timeout(self.page_timeout.as_millis() as u64)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfError::RenderingFailed(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        match tokio::fs::try_exists(&task.image_path).await {
            Ok(true) => Ok(task.image_path.clone()),
            Ok(false) => Err(PdfError::ImageMissing(task.page_number)),
            Err(e) => Err(PdfError::IOError(e.to_string())),
        }
    }
}
