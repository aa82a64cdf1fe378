//! In-process rasterization through Pdfium.
//!
//! Enabled with the `pdfium` feature. Pages are rendered at the configured
//! density unless that would exceed `max_image_dimension`, in which case the
//! density is lowered to fit.

use super::bindings::bind_pdfium;
use super::dpi::{PDF_POINTS_PER_INCH, calculate_optimal_dpi};
use super::error::{PdfError, Result};
use super::rasterizer::PageRasterizer;
use crate::core::config::RasterConfig;
use crate::types::PageTask;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRenderOptions {
    pub target_dpi: i32,
    pub max_image_dimension: i32,
    pub auto_adjust_dpi: bool,
}

impl Default for PageRenderOptions {
    fn default() -> Self {
        Self::from(&RasterConfig::default())
    }
}

impl From<&RasterConfig> for PageRenderOptions {
    fn from(config: &RasterConfig) -> Self {
        Self {
            target_dpi: config.dpi,
            max_image_dimension: config.max_image_dimension,
            auto_adjust_dpi: true,
        }
    }
}

fn map_load_error(err: PdfiumError) -> PdfError {
    let msg = err.to_string();
    if msg.to_lowercase().contains("password") {
        PdfError::PasswordRequired
    } else {
        PdfError::InvalidPdf(msg)
    }
}

/// Render one page (1-indexed) of `pdf_bytes`.
pub fn render_page(pdf_bytes: &[u8], page_number: usize, options: &PageRenderOptions) -> Result<DynamicImage> {
    let pdfium = Pdfium::new(bind_pdfium()?);
    let document = pdfium.load_pdf_from_byte_slice(pdf_bytes, None).map_err(map_load_error)?;

    let page_index = page_number
        .checked_sub(1)
        .and_then(|index| u16::try_from(index).ok())
        .ok_or(PdfError::PageNotFound(page_number))?;
    let page = document
        .pages()
        .get(page_index)
        .map_err(|_| PdfError::PageNotFound(page_number))?;

    let width_points = page.width().value;
    let height_points = page.height().value;

    let dpi = if options.auto_adjust_dpi {
        calculate_optimal_dpi(
            width_points as f64,
            height_points as f64,
            options.target_dpi,
            options.max_image_dimension,
        )
    } else {
        options.target_dpi
    };
    let scale = dpi as f64 / PDF_POINTS_PER_INCH;

    let config = PdfRenderConfig::new()
        .set_target_width(((width_points * scale as f32) as i32).max(1))
        .set_target_height(((height_points * scale as f32) as i32).max(1))
        .rotate_if_landscape(PdfPageRenderRotation::None, false);

    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| PdfError::RenderingFailed(format!("Failed to render page {}: {}", page_number, e)))?;

    Ok(DynamicImage::ImageRgb8(bitmap.as_image().into_rgb8()))
}

pub struct PdfiumRasterizer {
    options: PageRenderOptions,
}

impl PdfiumRasterizer {
    pub fn new(options: PageRenderOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &RasterConfig) -> Self {
        Self::new(PageRenderOptions::from(config))
    }
}

#[async_trait]
impl PageRasterizer for PdfiumRasterizer {
    fn name(&self) -> &str {
        "pdfium"
    }

    async fn rasterize(&self, task: &PageTask) -> Result<PathBuf> {
        let bytes = tokio::fs::read(task.document_path.as_path())
            .await
            .map_err(|e| PdfError::IOError(e.to_string()))?;
        let page_number = task.page_number;
        let image_path = task.image_path.clone();
        let options = self.options.clone();

        tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            let image = render_page(&bytes, page_number, &options)?;
            image
                .save_with_format(&image_path, ImageFormat::Png)
                .map_err(|e| PdfError::RenderingFailed(format!("Failed to write page {}: {}", page_number, e)))?;
            Ok(image_path)
        })
        .await
        .map_err(|e| PdfError::RenderingFailed(format!("render task failed: {}", e)))?
    }
}
