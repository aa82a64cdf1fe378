//! PDF handling: page counting and rasterization.
//!
//! Page counting and page sizes come from parsing the document with `lopdf`. Rasterization goes through a
//! [`PageRasterizer`]; [`PdftoppmRasterizer`] is always available and
//! `PdfiumRasterizer` is added by the `pdfium` feature.

#[cfg(feature = "pdfium")]
mod bindings;
mod dpi;
pub mod error;
pub mod page_count;
pub mod rasterizer;
#[cfg(feature = "pdfium")]
pub mod rendering;

pub use error::PdfError;
pub use page_count::{count_pages, page_sizes};
pub use rasterizer::{PageRasterizer, PdftoppmRasterizer};
#[cfg(feature = "pdfium")]
pub use rendering::{PageRenderOptions, PdfiumRasterizer, render_page};
