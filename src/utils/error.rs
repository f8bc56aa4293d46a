//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors raised while extracting fields from a single CSV record
///
/// These never abort a run: the dispatcher logs them and passes the
/// record through unresolved.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("Missing field {0}")]
    MissingField(usize),

    #[error("Invalid number in field {field}: {value:?}")]
    InvalidNumber { field: usize, value: String },

    #[error("Address range overflows: start {start:#x} + size {size}")]
    RangeOverflow { start: u64, size: u64 },
}

/// Errors that abort the streaming pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read input: {0}")]
    Input(#[source] std::io::Error),

    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

/// Errors that can occur during flamegraph generation
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("Empty stack data")]
    EmptyStacks,

    #[error("Failed to render flamegraph: {0}")]
    Render(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
