//! Scripted rasterizer and engine doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::{Document, Object, Stream, dictionary};
use pagescan::ocr::{OcrEngine, OcrError, RecognizeOptions};
use pagescan::pdf::{PageRasterizer, PdfError};
use pagescan::{Extractor, PageTask, ScanConfig};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Build a real PDF whose page `i` shows `page_texts[i]`.
pub fn create_pdf(page_texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for text in page_texts {
        let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", text);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_texts.len() as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Writes `page-<n>.png` containing `text of page <n>`.
#[derive(Default)]
pub struct ScriptedRasterizer {
    pub fail_pages: HashSet<usize>,
    /// Report success without writing the image.
    pub skip_write_pages: HashSet<usize>,
    pub delay: Duration,
    pub seen_workspaces: parking_lot::Mutex<Vec<PathBuf>>,
    pub calls: AtomicUsize,
}

impl ScriptedRasterizer {
    pub fn failing(pages: &[usize]) -> Self {
        Self {
            fail_pages: pages.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PageRasterizer for ScriptedRasterizer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn rasterize(&self, task: &PageTask) -> Result<PathBuf, PdfError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(parent) = task.image_path.parent() {
            self.seen_workspaces.lock().push(parent.to_path_buf());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_pages.contains(&task.page_number) {
            return Err(PdfError::RenderingFailed(format!("page {} is unreadable", task.page_number)));
        }
        if !task.document_path.exists() {
            return Err(PdfError::IOError("source document missing".to_string()));
        }
        if self.skip_write_pages.contains(&task.page_number) {
            return Err(PdfError::ImageMissing(task.page_number));
        }

        tokio::fs::write(&task.image_path, format!("text of page {}", task.page_number))
            .await
            .map_err(|e| PdfError::IOError(e.to_string()))?;
        Ok(task.image_path.clone())
    }
}

/// Returns the content of the image file. Per-page delays let tests force an
/// arbitrary completion order.
#[derive(Default)]
pub struct ScriptedEngine {
    pub delays: HashMap<usize, Duration>,
    pub default_delay: Duration,
    pub fail_pages: HashSet<usize>,
    pub running: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl ScriptedEngine {
    pub fn with_delays(delays: &[(usize, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(page, ms)| (*page, Duration::from_millis(*ms)))
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing(pages: &[usize]) -> Self {
        Self {
            fail_pages: pages.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn uniform(delay: Duration) -> Self {
        Self {
            default_delay: delay,
            ..Default::default()
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

fn page_of(image_path: &Path) -> usize {
    image_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.strip_prefix("page-"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl OcrEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(&self, image_path: &Path, _options: &RecognizeOptions) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let page = page_of(image_path);
        let delay = self.delays.get(&page).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = if self.fail_pages.contains(&page) {
            Err(OcrError::ProcessingFailed(format!("engine crashed on page {}", page)))
        } else {
            tokio::fs::read_to_string(image_path)
                .await
                .map_err(|e| OcrError::IOError(e.to_string()))
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn test_config(root: &Path) -> ScanConfig {
    let mut config = ScanConfig::default();
    config.workspace.root = root.to_path_buf();
    config.ocr.max_concurrent_pages = 3;
    config.job_timeout_ms = 30_000;
    config
}

pub fn extractor(
    config: ScanConfig,
    rasterizer: Arc<ScriptedRasterizer>,
    engine: Arc<ScriptedEngine>,
) -> Extractor {
    Extractor::new(config, rasterizer, engine)
}

/// Entries left under a workspace root.
pub fn residue(root: &Path) -> usize {
    std::fs::read_dir(root).map(|entries| entries.count()).unwrap_or(0)
}
