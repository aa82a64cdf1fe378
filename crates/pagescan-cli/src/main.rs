//! Pagescan CLI
//!
//! Runs one extraction job per invocation and prints the JSON report on stdout.
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pagescan::ocr::TESSERACT_LANGUAGE_CODES;
use pagescan::{
    Extractor, Job, PageRasterizer, PdftoppmRasterizer, ScanConfig, TesseractEngine, core::io::read_document,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Renderer {
    /// Poppler's pdftoppm, one process per page
    Pdftoppm,
    /// In-process Pdfium (requires the `pdfium` feature)
    Pdfium,
}

#[derive(Parser)]
#[command(name = "pagescan")]
#[command(version, about = "Extract text from scanned PDFs with page-level OCR", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the nearest pagescan.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a PDF and print the JSON report
    Extract {
        /// PDF file to process
        file: PathBuf,

        /// Tesseract language(s), `+`-joined (e.g. eng+hin)
        #[arg(short, long)]
        language: Option<String>,

        /// Rasterization density
        #[arg(long)]
        dpi: Option<i32>,

        /// Maximum pages recognized at once
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Whole-job deadline in seconds
        #[arg(short, long)]
        timeout_secs: Option<u64>,

        /// Directory for per-job scratch space
        #[arg(long)]
        workspace_root: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Renderer::Pdftoppm)]
        renderer: Renderer,

        /// Print only the extracted text instead of the JSON report
        #[arg(long)]
        text_only: bool,
    },

    /// List the supported language codes
    Languages,

    /// Report whether the external tools can be started
    Check,
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    let config = match path {
        Some(path) => ScanConfig::from_toml_file(path)?,
        None => ScanConfig::discover()?.unwrap_or_default(),
    };
    Ok(config)
}

fn rasterizer_for(renderer: Renderer, config: &ScanConfig) -> Result<Arc<dyn PageRasterizer>> {
    match renderer {
        Renderer::Pdftoppm => Ok(Arc::new(PdftoppmRasterizer::from_config(&config.raster))),
        #[cfg(feature = "pdfium")]
        Renderer::Pdfium => Ok(Arc::new(pagescan::pdf::PdfiumRasterizer::from_config(&config.raster))),
        #[cfg(not(feature = "pdfium"))]
        Renderer::Pdfium => anyhow::bail!("this build does not include the pdfium renderer"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            file,
            language,
            dpi,
            concurrency,
            timeout_secs,
            workspace_root,
            renderer,
            text_only,
        } => {
            if let Some(dpi) = dpi {
                config.raster.dpi = dpi;
            }
            if let Some(concurrency) = concurrency {
                config.ocr.max_concurrent_pages = concurrency;
            }
            if let Some(secs) = timeout_secs {
                config.job_timeout_ms = secs.saturating_mul(1000);
            }
            if let Some(root) = workspace_root {
                config.workspace.root = root;
            }
            config.validate()?;

            let bytes = read_document(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut job = Job::new(bytes, language.unwrap_or_default());
            if let Some(name) = file.file_name() {
                job = job.with_file_name(name.to_string_lossy());
            }

            let rasterizer = rasterizer_for(renderer, &config)?;
            let engine = Arc::new(TesseractEngine::from_config(&config.ocr));
            let extractor = Extractor::new(config, rasterizer, engine);

            let report = extractor.extract(job).await?;
            if text_only {
                println!("{}", report.text);
            } else {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }

            if report.is_degraded() {
                tracing::warn!(failed_pages = ?report.failed_pages(), "Some pages could not be recognized");
            }
            Ok(())
        }

        Commands::Languages => {
            for code in TESSERACT_LANGUAGE_CODES {
                println!("{}", code);
            }
            Ok(())
        }

        Commands::Check => {
            let pdftoppm = PdftoppmRasterizer::from_config(&config.raster).is_available().await;
            let tesseract = TesseractEngine::from_config(&config.ocr).is_available().await;

            let status = serde_json::json!({
                "status": if pdftoppm && tesseract { "ok" } else { "degraded" },
                "pdftoppm": pdftoppm,
                "tesseract": tesseract,
                "maxConcurrentPages": config.ocr.max_concurrent_pages,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);

            if !(pdftoppm && tesseract) {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
