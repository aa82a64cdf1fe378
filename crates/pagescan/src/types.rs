//! Data model for a single extraction job.
//!
//! A [`Job`] owns everything created on its behalf: one workspace, one
//! [`PageTask`] per page and one [`PageResult`] per page. Nothing here is shared
//! across jobs. The final product is an [`ExtractionReport`], which serializes to
//! the camelCase JSON shape handed back to the transport layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use uuid::Uuid;

/// One extraction request.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub document: Arc<[u8]>,
    /// Tesseract language set, e.g. `eng` or `eng+hin`.
    pub language: String,
    /// Original upload name, if the transport layer knows it.
    pub file_name: Option<String>,
    pub created_at: SystemTime,
}

impl Job {
    pub fn new(document: impl Into<Arc<[u8]>>, language: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            document: document.into(),
            language: language.into(),
            file_name: None,
            created_at: SystemTime::now(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// One page's unit of work.
///
/// `image_path` is assigned when the task is created and only materialized by
/// the rasterizer.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTask {
    /// 1-indexed page number.
    pub page_number: usize,
    pub document_path: Arc<PathBuf>,
    pub image_path: PathBuf,
    /// `None` when the page has no readable MediaBox.
    pub page_size: Option<PageSize>,
}

/// Why a page produced no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    Conversion { page_number: usize, cause: String },
    Recognition { page_number: usize, cause: String },
}

impl PageError {
    pub fn page_number(&self) -> usize {
        match self {
            Self::Conversion { page_number, .. } | Self::Recognition { page_number, .. } => *page_number,
        }
    }

    pub fn cause(&self) -> &str {
        match self {
            Self::Conversion { cause, .. } | Self::Recognition { cause, .. } => cause,
        }
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversion { page_number, cause } => {
                write!(f, "Page {} conversion failed: {}", page_number, cause)
            }
            Self::Recognition { page_number, cause } => {
                write!(f, "Page {} recognition failed: {}", page_number, cause)
            }
        }
    }
}

impl std::error::Error for PageError {}

/// Terminal status of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageStatus {
    Ok,
    ConversionFailed,
    RecognitionFailed,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ConversionFailed => "conversionFailed",
            Self::RecognitionFailed => "recognitionFailed",
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognized text, or why there is none.
pub type PageOutcome = std::result::Result<String, PageError>;

/// Outcome of a [`PageTask`]. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub page_number: usize,
    pub outcome: PageOutcome,
}

impl PageResult {
    pub fn ok(page_number: usize, text: impl Into<String>) -> Self {
        Self {
            page_number,
            outcome: Ok(text.into()),
        }
    }

    pub fn conversion_failed(page_number: usize, cause: impl Into<String>) -> Self {
        Self {
            page_number,
            outcome: Err(PageError::Conversion {
                page_number,
                cause: cause.into(),
            }),
        }
    }

    pub fn recognition_failed(page_number: usize, cause: impl Into<String>) -> Self {
        Self {
            page_number,
            outcome: Err(PageError::Recognition {
                page_number,
                cause: cause.into(),
            }),
        }
    }

    pub fn status(&self) -> PageStatus {
        match &self.outcome {
            Ok(_) => PageStatus::Ok,
            Err(PageError::Conversion { .. }) => PageStatus::ConversionFailed,
            Err(PageError::Recognition { .. }) => PageStatus::RecognitionFailed,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(PageError::cause)
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-page line of the status log, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStatusEntry {
    pub page: usize,
    pub status: PageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&PageResult> for PageStatusEntry {
    fn from(result: &PageResult) -> Self {
        Self {
            page: result.page_number,
            status: result.status(),
            detail: result.error_detail().map(str::to_string),
        }
    }
}

/// Progress trail entry, recorded in completion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub page: usize,
    pub status: PageStatus,
    /// Milliseconds since the job started.
    pub elapsed_ms: u64,
}

/// What the job was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub size_bytes: usize,
}

/// Final product of a job. Produced once, read-only thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub job_id: Uuid,
    pub text: String,
    pub page_count: usize,
    pub pages_recognized: usize,
    pub elapsed_seconds: f64,
    pub language_used: String,
    pub source: SourceInfo,
    pub per_page_status: Vec<PageStatusEntry>,
    pub progress: Vec<ProgressEntry>,
}

impl ExtractionReport {
    /// True when at least one page carries an error marker.
    pub fn is_degraded(&self) -> bool {
        self.pages_recognized < self.page_count
    }

    pub fn failed_pages(&self) -> Vec<usize> {
        self.per_page_status
            .iter()
            .filter(|entry| entry.status != PageStatus::Ok)
            .map(|entry| entry.page)
            .collect()
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
