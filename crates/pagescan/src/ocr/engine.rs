//! OCR engine trait.

use super::error::OcrError;
use super::types::RecognizeOptions;
use super::validation::validate_language_code;
use async_trait::async_trait;
use std::path::Path;

/// A black-box `recognize(image, options) -> text` capability.
///
/// Engines must be `Send + Sync`: the worker pool shares one instance across
/// all of its workers. An engine reads the image it is given and nothing else;
/// it never writes into the job workspace.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use pagescan::ocr::{OcrEngine, OcrError, RecognizeOptions};
/// use std::path::Path;
///
/// struct FileNameEngine;
///
/// #[async_trait]
/// impl OcrEngine for FileNameEngine {
///     fn name(&self) -> &str {
///         "file-name"
///     }
///
///     async fn recognize(&self, image_path: &Path, _options: &RecognizeOptions) -> Result<String, OcrError> {
///         Ok(image_path.display().to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize the text of one page image.
    ///
    /// # Errors
    ///
    /// Any `OcrError`. The pool turns it into a `RecognitionFailed` page result;
    /// it never aborts sibling pages.
    async fn recognize(&self, image_path: &Path, options: &RecognizeOptions) -> Result<String, OcrError>;

    fn supports_language(&self, lang: &str) -> bool {
        validate_language_code(lang).is_ok()
    }
}

/// Remove control characters other than newlines and tabs.
///
/// Tesseract terminates every page with a form feed, which would otherwise end
/// up inside the aggregated text.
pub fn strip_control_characters(text: &str) -> String {
    if text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        text.chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_control_characters_removes_form_feed() {
        assert_eq!(strip_control_characters("Hello\nWorld\n\u{000C}"), "Hello\nWorld\n");
    }

    #[test]
    fn test_strip_control_characters_keeps_plain_text() {
        assert_eq!(strip_control_characters("a\tb\r\nc"), "a\tb\r\nc");
    }
}
