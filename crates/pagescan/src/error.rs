//! Error types for pagescan.
//!
//! Job-level failures use [`PageScanError`]. Page-level failures never show up
//! here: a page that fails to rasterize or recognize is recorded as a
//! [`PageError`](crate::types::PageError) inside its `PageResult`, and the job
//! still completes with a degraded report.
//!
//! - `Io` wraps `std::io::Error` and always bubbles up unchanged
//! - `Input`, `Workspace` and `Timeout` abort the whole job
//! - `Config` covers invalid settings and unreadable config files
//! - `Aggregation` signals a broken coverage invariant and should never surface
//!
//! # Example
//!
//! ```rust
//! use pagescan::{PageScanError, Result};
//!
//! fn require_bytes(bytes: &[u8]) -> Result<()> {
//!     if bytes.is_empty() {
//!         return Err(PageScanError::input("document is empty"));
//!     }
//!     Ok(())
//! }
//! # assert!(require_bytes(b"").is_err());
//! ```
use thiserror::Error;

/// Result type alias using `PageScanError`.
pub type Result<T> = std::result::Result<T, PageScanError>;

/// Main error type for job-level failures.
#[derive(Debug, Error)]
pub enum PageScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input error: {message}")]
    Input {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Workspace error: {message}")]
    Workspace {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Aggregation error: {message}")]
    Aggregation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Job timed out after {limit_ms} ms")]
    Timeout { limit_ms: u64 },

    #[error("{0}")]
    Other(String),
}

impl PageScanError {
    /// Whether the caller supplied something invalid (`Input`, `Config`) as
    /// opposed to the job failing on the host side.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Input { .. } | Self::Config { .. })
    }
}

impl From<serde_json::Error> for PageScanError {
    fn from(err: serde_json::Error) -> Self {
        PageScanError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<crate::pdf::PdfError> for PageScanError {
    fn from(err: crate::pdf::PdfError) -> Self {
        PageScanError::Input {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl PageScanError {
    error_constructor!(input, Input);
    error_constructor!(workspace, Workspace);
    error_constructor!(config, Config);
    error_constructor!(aggregation, Aggregation);
    error_constructor!(serialization, Serialization);
}
