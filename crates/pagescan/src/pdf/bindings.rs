use super::error::PdfError;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use pdfium_render::prelude::*;
use std::path::PathBuf;

/// Environment variable naming a directory that holds the Pdfium shared library.
pub const PDFIUM_DIR_ENV: &str = "PAGESCAN_PDFIUM_DIR";

enum InitializationState {
    Uninitialized,
    Initialized { lib_dir: Option<PathBuf> },
    Failed(String),
}

/// Binding outcome of the first call, reused by every later call.
///
/// Bindings themselves are not `Clone`, so only the library location (or the
/// error) is cached and fresh bindings are created from it.
static PDFIUM_STATE: Lazy<Mutex<InitializationState>> = Lazy::new(|| Mutex::new(InitializationState::Uninitialized));

fn bind_to(lib_dir: Option<&PathBuf>) -> Result<Box<dyn PdfiumLibraryBindings>, String> {
    match lib_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .map_err(|e| format!("Failed to bind Pdfium in {}: {}", dir.display(), e)),
        None => Pdfium::bind_to_system_library().map_err(|e| format!("Failed to bind system Pdfium: {}", e)),
    }
}

pub(crate) fn bind_pdfium() -> Result<Box<dyn PdfiumLibraryBindings>, PdfError> {
    let mut state = PDFIUM_STATE.lock();

    match &*state {
        InitializationState::Uninitialized => {
            let lib_dir = std::env::var_os(PDFIUM_DIR_ENV).map(PathBuf::from);
            match bind_to(lib_dir.as_ref()) {
                Ok(bindings) => {
                    tracing::debug!(lib_dir = ?lib_dir, "Pdfium initialized");
                    *state = InitializationState::Initialized { lib_dir };
                    Ok(bindings)
                }
                Err(err) => {
                    *state = InitializationState::Failed(err.clone());
                    Err(PdfError::ToolUnavailable(err))
                }
            }
        }
        InitializationState::Initialized { lib_dir } => bind_to(lib_dir.as_ref()).map_err(PdfError::ToolUnavailable),
        InitializationState::Failed(err) => Err(PdfError::ToolUnavailable(format!(
            "Pdfium initialization previously failed: {}",
            err
        ))),
    }
}
