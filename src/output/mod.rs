//! Output writers for folded stacks, reports and flamegraphs.
//!
//! This module handles writing data to disk in various formats:
//! - Folded stack files (flamegraph input)
//! - SVG flamegraphs
//! - JSON run reports

pub mod folded;
pub mod json;
pub mod svg;

// Re-export main functions
pub use folded::{write_folded, write_folded_file};
pub use json::{read_report, write_report, RunReport};
pub use svg::write_svg;

use crate::utils::error::OutputError;
use log::debug;
use std::fs::File;
use std::path::Path;

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Validate `path`, create its parent directories and open it for writing
pub fn create_output_file(path: &Path) -> Result<File, OutputError> {
    validate_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    File::create(path).map_err(OutputError::WriteFailed)
}
