//! Tesseract command-line engine.
//!
//! Runs `tesseract <image> stdout -l <lang> --oem <n> --psm <n>` once per page.
//! The child process is killed if the recognition future is dropped, so a job
//! that times out does not leave orphaned engines behind.

use super::engine::{OcrEngine, strip_control_characters};
use super::error::OcrError;
use super::types::RecognizeOptions;
use crate::core::config::OcrConfig;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

pub struct TesseractEngine {
    binary: String,
    page_timeout: Duration,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<String>, page_timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            page_timeout,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            config.tesseract_path.clone(),
            Duration::from_millis(config.page_timeout_ms),
        )
    }

    /// Whether `tesseract --version` runs successfully.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::from_config(&OcrConfig::default())
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image_path: &Path, options: &RecognizeOptions) -> Result<String, OcrError> {
        let child = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&options.language)
            .arg("--oem")
            .arg(options.oem.as_u8().to_string())
            .arg("--psm")
            .arg(options.psm.as_u8().to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    OcrError::EngineUnavailable(format!("'{}' not found on PATH", self.binary))
                }
                _ => OcrError::IOError(format!("Failed to start '{}': {}", self.binary, e)),
            })?;

        let output = match timeout(self.page_timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(OcrError::IOError(format!("Failed to wait for tesseract: {}", e))),
            Err(_) => return Err(OcrError::Timeout(self.page_timeout.as_millis() as u64)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingFailed(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(strip_control_characters(&text))
    }
}
