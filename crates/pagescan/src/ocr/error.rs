use std::fmt;

/// Errors raised by an OCR engine for a single image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    InvalidLanguageCode(String),
    EngineUnavailable(String),
    ProcessingFailed(String),
    Timeout(u64),
    IOError(String),
}

impl fmt::Display for OcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLanguageCode(msg) => write!(f, "Invalid language code: {}", msg),
            Self::EngineUnavailable(msg) => write!(f, "OCR engine unavailable: {}", msg),
            Self::ProcessingFailed(msg) => write!(f, "OCR processing failed: {}", msg),
            Self::Timeout(ms) => write!(f, "OCR timed out after {} ms", ms),
            Self::IOError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for OcrError {}
