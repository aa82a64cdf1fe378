//! Pagescan - page-level OCR for scanned PDFs
//!
//! Pagescan turns an image-only PDF into text. Every page is rasterized into a
//! private scratch directory, recognized by an OCR engine under a fixed
//! concurrency cap, and the results are stitched back together in page order.
//! A page that fails is replaced by a marker instead of failing the job.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pagescan::{ScanConfig, extract_file};
//!
//! # async fn example() -> pagescan::Result<()> {
//! let config = ScanConfig::default();
//! let report = extract_file("scan.pdf", "eng+hin", &config).await?;
//! println!("{}", report.text);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): configuration, input validation, workspaces, job orchestration
//! - **PDF** (`pdf`): page counting and the [`PageRasterizer`] adapters
//! - **OCR** (`ocr`): the [`OcrEngine`] trait and the Tesseract CLI engine
//! - **Pool** (`pool`): bounded OCR worker pool
//! - **Aggregate** (`aggregate`): page-ordered reassembly
//!
//! Rasterizer and engine are traits, so tests and embedders can swap either
//! for their own implementation through [`Extractor::new`].

#![deny(unsafe_code)]

pub mod aggregate;
pub mod core;
pub mod error;
pub mod ocr;
pub mod pdf;
pub mod pool;
pub mod types;

pub use error::{PageScanError, Result};
pub use types::*;

pub use core::config::ScanConfig;
pub use core::orchestrator::{Extractor, extract_bytes, extract_file};
pub use core::workspace::Workspace;

pub use ocr::{OcrEngine, OcrError, RecognizeOptions, TesseractEngine};
pub use pdf::{PageRasterizer, PdfError, PdftoppmRasterizer};
pub use pool::{OcrWorkerPool, PendingPage, PoolStats};
