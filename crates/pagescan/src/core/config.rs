//! Configuration loading and management.
//!
//! [`ScanConfig`] can be built programmatically, loaded from a TOML file, or
//! discovered by walking up from the current directory to the nearest
//! `pagescan.toml`. Every field has a default, so a partial file is valid.
//!
//! ```toml
//! job_timeout_ms = 300000
//!
//! [workspace]
//! root = "/var/tmp/pagescan"
//!
//! [raster]
//! dpi = 300
//!
//! [ocr]
//! language = "eng+hin"
//! max_concurrent_pages = 3
//! ```

use crate::ocr::{OemMode, PSMMode, RecognizeOptions};
use crate::{PageScanError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up by [`ScanConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "pagescan.toml";

/// Lowest and highest rasterization density accepted.
pub const MIN_DPI: i32 = 72;
pub const MAX_DPI: i32 = 600;

/// Main pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub raster: RasterConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    /// Wall-clock deadline for a whole job.
    #[serde(default = "default_job_timeout_ms")]
    pub job_timeout_ms: u64,
}

/// Scratch space configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory under which one sub-directory per job is created.
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,
}

/// Page rasterization configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Target density in dots per inch.
    #[serde(default = "default_dpi")]
    pub dpi: i32,

    /// Largest edge, in pixels, a rendered page may have. Pages that would
    /// exceed it are rendered at a lower density. The default is the long
    /// edge of A4 at 300 DPI.
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: i32,

    #[serde(default = "default_pdftoppm_path")]
    pub pdftoppm_path: String,

    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,
}

/// OCR configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Language code(s), `+`-joined for multi-language pages.
    #[serde(default = "default_eng")]
    pub language: String,

    /// Tesseract engine mode (`--oem`).
    #[serde(default = "default_oem")]
    pub oem: u8,

    /// Tesseract page segmentation mode (`--psm`).
    #[serde(default = "default_psm")]
    pub psm: u8,

    /// Maximum number of pages recognized at the same time.
    #[serde(default = "default_max_concurrent_pages")]
    pub max_concurrent_pages: usize,

    #[serde(default = "default_tesseract_path")]
    pub tesseract_path: String,

    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,
}

fn default_workspace_root() -> PathBuf {
    std::env::temp_dir().join("pagescan")
}

fn default_dpi() -> i32 {
    300
}

fn default_max_image_dimension() -> i32 {
    3508
}

fn default_pdftoppm_path() -> String {
    "pdftoppm".to_string()
}

fn default_tesseract_path() -> String {
    "tesseract".to_string()
}

fn default_page_timeout_ms() -> u64 {
    120_000
}

fn default_job_timeout_ms() -> u64 {
    300_000
}

fn default_eng() -> String {
    "eng".to_string()
}

fn default_oem() -> u8 {
    OemMode::LstmOnly.as_u8()
}

fn default_psm() -> u8 {
    PSMMode::Auto.as_u8()
}

fn default_max_concurrent_pages() -> usize {
    num_cpus::get().clamp(1, 3)
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workspace: WorkspaceConfig::default(),
            raster: RasterConfig::default(),
            ocr: OcrConfig::default(),
            job_timeout_ms: default_job_timeout_ms(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
        }
    }
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            max_image_dimension: default_max_image_dimension(),
            pdftoppm_path: default_pdftoppm_path(),
            page_timeout_ms: default_page_timeout_ms(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_eng(),
            oem: default_oem(),
            psm: default_psm(),
            max_concurrent_pages: default_max_concurrent_pages(),
            tesseract_path: default_tesseract_path(),
            page_timeout_ms: default_page_timeout_ms(),
        }
    }
}

impl OcrConfig {
    /// Recognition options for a job, using `language` when it is non-empty.
    pub fn recognize_options(&self, language: &str) -> Result<RecognizeOptions> {
        let language = if language.trim().is_empty() {
            self.language.clone()
        } else {
            language.trim().to_string()
        };

        Ok(RecognizeOptions {
            language,
            oem: OemMode::from_u8(self.oem).map_err(PageScanError::config)?,
            psm: PSMMode::from_u8(self.psm).map_err(PageScanError::config)?,
        })
    }
}

impl ScanConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `PageScanError::Config` if the file is unreadable or not valid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PageScanError::config(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        Self::from_toml_str(&content)
            .map_err(|e| PageScanError::config(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Find `pagescan.toml` in the current directory or any parent.
    ///
    /// Returns `Ok(None)` when no file is found.
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(PageScanError::Io)?;
        Self::discover_from(&current)
    }

    pub fn discover_from(start: &Path) -> Result<Option<Self>> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "Loading discovered config");
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Check value ranges and the default language.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.raster.dpi) {
            return Err(PageScanError::config(format!(
                "raster.dpi must be between {} and {}, got {}",
                MIN_DPI, MAX_DPI, self.raster.dpi
            )));
        }

        if self.raster.max_image_dimension <= 0 {
            return Err(PageScanError::config("raster.max_image_dimension must be positive"));
        }

        if self.ocr.max_concurrent_pages == 0 {
            return Err(PageScanError::config("ocr.max_concurrent_pages must be at least 1"));
        }

        if self.job_timeout_ms == 0 || self.raster.page_timeout_ms == 0 || self.ocr.page_timeout_ms == 0 {
            return Err(PageScanError::config("timeouts must be greater than zero"));
        }

        crate::ocr::validate_language_code(&self.ocr.language)
            .map_err(|e| PageScanError::config_with_source("ocr.language is not usable", e))?;

        self.ocr.recognize_options(&self.ocr.language)?;

        Ok(())
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.raster.dpi, 300);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.oem, 1);
        assert_eq!(config.ocr.psm, 3);
        assert!((1..=3).contains(&config.ocr.max_concurrent_pages));
        assert_eq!(config.job_timeout(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = ScanConfig::from_toml_str(
            r#"
            job_timeout_ms = 1000

            [ocr]
            language = "eng+hin"
            max_concurrent_pages = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.job_timeout_ms, 1000);
        assert_eq!(config.ocr.language, "eng+hin");
        assert_eq!(config.ocr.max_concurrent_pages, 5);
        assert_eq!(config.ocr.psm, 3);
        assert_eq!(config.raster.dpi, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_dpi_out_of_range() {
        let mut config = ScanConfig::default();
        config.raster.dpi = 1200;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PageScanError::Config { .. }));
        assert!(err.to_string().contains("dpi"));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = ScanConfig::default();
        config.ocr.max_concurrent_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_language() {
        let mut config = ScanConfig::default();
        config.ocr.language = "klingon".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_psm() {
        let mut config = ScanConfig::default();
        config.ocr.psm = 42;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_recognize_options_falls_back_to_default_language() {
        let config = OcrConfig::default();
        let options = config.recognize_options("  ").unwrap();
        assert_eq!(options.language, "eng");
        assert_eq!(options.oem, OemMode::LstmOnly);
        assert_eq!(options.psm, PSMMode::Auto);

        let options = config.recognize_options("hin").unwrap();
        assert_eq!(options.language, "hin");
    }

    #[test]
    fn test_from_toml_file_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[raster]\ndpi = 200\n").unwrap();

        let loaded = ScanConfig::from_toml_file(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(loaded.raster.dpi, 200);

        let discovered = ScanConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(discovered, loaded);
    }

    #[test]
    fn test_from_toml_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[raster\ndpi = ").unwrap();

        let err = ScanConfig::from_toml_file(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = ScanConfig::from_toml_file("/nonexistent/pagescan.toml").unwrap_err();
        assert!(matches!(err, PageScanError::Config { .. }));
    }
}
