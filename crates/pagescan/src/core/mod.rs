//! Core pipeline: configuration, input handling, workspaces and the job
//! orchestrator.

pub mod config;
pub mod io;
pub mod orchestrator;
pub mod workspace;

pub use config::ScanConfig;
pub use orchestrator::{Extractor, extract_bytes, extract_file};
pub use workspace::Workspace;
