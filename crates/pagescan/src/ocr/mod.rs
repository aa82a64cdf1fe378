//! OCR capability.
//!
//! The pipeline treats OCR as a black box behind [`OcrEngine`]. The default
//! implementation, [`TesseractEngine`], shells out to the `tesseract` binary with
//! the job's language set, engine mode and page segmentation mode.
//!
//! # Example
//!
//! ```rust,no_run
//! use pagescan::ocr::{OcrEngine, RecognizeOptions, TesseractEngine};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), pagescan::ocr::OcrError> {
//! let engine = TesseractEngine::default();
//! let text = engine.recognize(Path::new("page-1.png"), &RecognizeOptions::default()).await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```
pub mod engine;
pub mod error;
pub mod tesseract;
pub mod types;
pub mod validation;

pub use engine::{OcrEngine, strip_control_characters};
pub use error::OcrError;
pub use tesseract::TesseractEngine;
pub use types::{OemMode, PSMMode, RecognizeOptions};
pub use validation::{TESSERACT_LANGUAGE_CODES, is_supported_language, validate_language_code};
