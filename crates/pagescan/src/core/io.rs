//! Input reading and validation.
//!
//! Everything here runs before a workspace exists, so a rejected request never
//! touches the filesystem.

use crate::ocr::validate_language_code;
use crate::{PageScanError, Result};
use std::path::Path;
use tokio::fs;

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Read a document from disk.
///
/// # Errors
///
/// Returns `PageScanError::Io` for I/O errors (these always bubble up).
pub async fn read_document(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    fs::read(path.as_ref()).await.map_err(PageScanError::Io)
}

/// Validate uploaded document bytes.
///
/// # Arguments
///
/// * `bytes` - Raw document content
/// * `file_name` - Upload name, if the caller has one
///
/// # Errors
///
/// Returns `PageScanError::Input` if the bytes are empty, are not a PDF by
/// magic number, or the file name does not end in `.pdf`.
pub fn validate_document(bytes: &[u8], file_name: Option<&str>) -> Result<()> {
    if bytes.is_empty() {
        return Err(PageScanError::input("No file uploaded: document is empty"));
    }

    if let Some(name) = file_name
        && !name.to_ascii_lowercase().ends_with(".pdf")
    {
        return Err(PageScanError::input(format!("Only PDF files are supported, got '{}'", name)));
    }

    match infer::get(bytes) {
        Some(kind) if kind.mime_type() == PDF_MIME_TYPE => Ok(()),
        Some(kind) => Err(PageScanError::input(format!(
            "Only PDF files are supported, detected {}",
            kind.mime_type()
        ))),
        None => Err(PageScanError::input("Only PDF files are supported, file type not recognized")),
    }
}

/// Resolve the language for a job.
///
/// An empty or blank `requested` value falls back to `default_language`.
/// Returns the trimmed language string that will be passed to the engine.
///
/// # Errors
///
/// Returns `PageScanError::Input` if any `+`-joined code is not a known
/// Tesseract language.
pub fn validate_language(requested: &str, default_language: &str) -> Result<String> {
    let language = match requested.trim() {
        "" => default_language.trim(),
        trimmed => trimmed,
    };

    validate_language_code(language)
        .map_err(|e| PageScanError::input_with_source(format!("Unsupported language '{}'", language), e))?;

    Ok(language.to_string())
}
