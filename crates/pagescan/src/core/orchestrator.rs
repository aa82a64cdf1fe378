//! Job orchestration.
//!
//! [`Extractor::extract`] runs one job end to end:
//!
//! 1. validate the document and language (no side effects yet)
//! 2. acquire a workspace and persist the document
//! 3. count pages and read their sizes
//! 4. rasterize page k, hand it to the OCR pool, move on to page k+1
//! 5. wait for every page, then aggregate in page order
//!
//! Steps 2 to 5 run under the job deadline. The workspace is released after
//! them on every path, including timeout. Each page is recorded the moment it
//! settles: a rasterization failure as `ConversionFailed` right away, an OCR
//! result from the task awaiting it. Every page has exactly one result before
//! aggregation and the progress trail is in completion order.

use crate::aggregate::{ResultCollector, aggregate};
use crate::core::config::ScanConfig;
use crate::core::io::{read_document, validate_document, validate_language};
use crate::core::workspace::Workspace;
use crate::ocr::{OcrEngine, RecognizeOptions, TesseractEngine};
use crate::pdf::{PageRasterizer, PdftoppmRasterizer};
use crate::pool::{OcrWorkerPool, PoolStats};
use crate::types::{ExtractionReport, Job, PageResult, PageTask, SourceInfo};
use crate::{PageScanError, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio::time::timeout;

pub struct Extractor {
    config: ScanConfig,
    rasterizer: Arc<dyn PageRasterizer>,
    engine: Arc<dyn OcrEngine>,
    last_pool_stats: parking_lot::Mutex<Option<Arc<PoolStats>>>,
}

impl Extractor {
    pub fn new(config: ScanConfig, rasterizer: Arc<dyn PageRasterizer>, engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            config,
            rasterizer,
            engine,
            last_pool_stats: parking_lot::Mutex::new(None),
        }
    }

    /// Extractor backed by `pdftoppm` and the `tesseract` CLI.
    ///
    /// # Errors
    ///
    /// `PageScanError::Config` if `config` does not validate.
    pub fn from_config(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let rasterizer = Arc::new(PdftoppmRasterizer::from_config(&config.raster));
        let engine = Arc::new(TesseractEngine::from_config(&config.ocr));
        Ok(Self::new(config, rasterizer, engine))
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Counters of the pool used by the most recent job.
    pub fn last_pool_stats(&self) -> Option<Arc<PoolStats>> {
        self.last_pool_stats.lock().clone()
    }

    /// Run one job.
    ///
    /// # Errors
    ///
    /// - `Input` for an empty, non-PDF or unparseable document, or an unknown language
    /// - `Workspace` if the scratch directory cannot be created or written
    /// - `Timeout` if the job outlives `job_timeout_ms`
    ///
    /// Page failures are not errors; they appear as markers in the report.
    #[tracing::instrument(skip_all, fields(job_id = %job.id, pages = tracing::field::Empty))]
    pub async fn extract(&self, job: Job) -> Result<ExtractionReport> {
        let started = Instant::now();

        validate_document(&job.document, job.file_name.as_deref())?;
        let language = validate_language(&job.language, &self.config.ocr.language)?;
        let options = self.config.ocr.recognize_options(&language)?;

        let mut workspace = Workspace::acquire(&self.config.workspace.root, job.id).await?;
        let limit = self.config.job_timeout();

        let outcome = timeout(limit, self.run(&job, &workspace, options, started)).await;
        workspace.release().await;

        match outcome {
            Ok(Ok(report)) => {
                tracing::info!(
                    pages = report.page_count,
                    recognized = report.pages_recognized,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Extraction finished"
                );
                Ok(report)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Extraction failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(limit_ms = self.config.job_timeout_ms, "Extraction timed out");
                Err(PageScanError::Timeout {
                    limit_ms: self.config.job_timeout_ms,
                })
            }
        }
    }

    async fn run(
        &self,
        job: &Job,
        workspace: &Workspace,
        options: RecognizeOptions,
        started: Instant,
    ) -> Result<ExtractionReport> {
        let document_path = Arc::new(workspace.persist_document(&job.document).await?);
        let page_sizes = self.rasterizer.page_sizes(Arc::clone(&job.document)).await?;
        let total = page_sizes.len();
        tracing::Span::current().record("pages", total);
        tracing::info!(
            pages = total,
            language = %options.language,
            rasterizer = self.rasterizer.name(),
            engine = self.engine.name(),
            "Extraction started"
        );

        let language_used = options.language.clone();
        let collector = Arc::new(ResultCollector::new(total, started));
        let pool = OcrWorkerPool::new(
            Arc::clone(&self.engine),
            options,
            self.config.ocr.max_concurrent_pages,
        );
        *self.last_pool_stats.lock() = Some(pool.stats());
        let mut in_flight: JoinSet<Result<()>> = JoinSet::new();

        for (page_number, page_size) in (1..=total).zip(page_sizes) {
            let task = PageTask {
                page_number,
                document_path: Arc::clone(&document_path),
                image_path: workspace.page_image_path(page_number),
                page_size,
            };

            match self.rasterizer.rasterize(&task).await {
                Ok(image_path) => {
                    tracing::debug!(page = page_number, "Page rasterized");
                    let pending = pool.submit(PageTask { image_path, ..task });
                    let collector = Arc::clone(&collector);
                    in_flight.spawn(async move { collector.record(pending.wait().await) });
                }
                Err(e) => {
                    tracing::warn!(page = page_number, error = %e, "Page conversion failed");
                    collector.record(PageResult::conversion_failed(page_number, e.to_string()))?;
                }
            }

            while let Some(joined) = in_flight.try_join_next() {
                settled(joined)?;
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            settled(joined)?;
        }
        pool.shutdown().await;

        let collector = Arc::into_inner(collector)
            .ok_or_else(|| PageScanError::aggregation("page results still being recorded"))?;
        let (results, progress) = collector.finish()?;
        let aggregate = aggregate(total, results)?;

        Ok(ExtractionReport {
            job_id: job.id,
            text: aggregate.text,
            page_count: total,
            pages_recognized: aggregate.pages_recognized,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            language_used,
            source: SourceInfo {
                file_name: job.file_name.clone(),
                size_bytes: job.document.len(),
            },
            per_page_status: aggregate.per_page_status,
            progress,
        })
    }
}

fn settled(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    joined.map_err(|e| PageScanError::Other(format!("Page task panicked: {}", e)))?
}

/// Extract text from PDF bytes with the default adapters.
///
/// # Example
///
/// ```rust,no_run
/// use pagescan::{ScanConfig, extract_bytes};
///
/// # async fn example() -> pagescan::Result<()> {
/// let bytes = std::fs::read("scan.pdf")?;
/// let report = extract_bytes(bytes, "eng", &ScanConfig::default()).await?;
/// println!("{}", report.text);
/// # Ok(())
/// # }
/// ```
pub async fn extract_bytes(bytes: Vec<u8>, language: &str, config: &ScanConfig) -> Result<ExtractionReport> {
    let extractor = Extractor::from_config(config.clone())?;
    extractor.extract(Job::new(bytes, language)).await
}

/// Read `path` and extract it with the default adapters, keeping the file name
/// in the report.
pub async fn extract_file(path: impl AsRef<Path>, language: &str, config: &ScanConfig) -> Result<ExtractionReport> {
    let path = path.as_ref();
    let bytes = read_document(path).await?;
    let mut job = Job::new(bytes, language);
    if let Some(name) = path.file_name() {
        job = job.with_file_name(name.to_string_lossy());
    }

    let extractor = Extractor::from_config(config.clone())?;
    extractor.extract(job).await
}
