use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfError {
    InvalidPdf(String),
    PasswordRequired,
    PageNotFound(usize),
    RenderingFailed(String),
    ToolUnavailable(String),
    ImageMissing(usize),
    Timeout(u64),
    IOError(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::InvalidPdf(msg) => write!(f, "Invalid PDF: {}", msg),
            PdfError::PasswordRequired => write!(f, "PDF is password-protected"),
            PdfError::PageNotFound(page) => write!(f, "Page {} not found", page),
            PdfError::RenderingFailed(msg) => write!(f, "Page rendering failed: {}", msg),
            PdfError::ToolUnavailable(msg) => write!(f, "Rasterizer unavailable: {}", msg),
            PdfError::ImageMissing(page) => write!(f, "Image not found for page {}", page),
            PdfError::Timeout(ms) => write!(f, "Rasterization timed out after {} ms", ms),
            PdfError::IOError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(io_err) => PdfError::IOError(io_err.to_string()),
            _ => PdfError::InvalidPdf(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;
