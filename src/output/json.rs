//! JSON run report writer.
//!
//! The report records what a run did: counters, the sample distribution
//! and the hottest stacks. Schema is versioned to allow future evolution.

use super::create_output_file;
use crate::aggregator::{HotStack, SampleDistribution};
use crate::pipeline::RunStats;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Top-level report structure written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Input CSV path
    pub input: String,

    /// Process name or pid whose stacks were folded
    pub target: String,

    pub target_is_pid: bool,

    /// Folded output path
    pub folded_output: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_output: Option<String>,

    pub stats: RunStats,

    pub distribution: SampleDistribution,

    /// Most sampled stacks, hottest first
    pub hot_stacks: Vec<HotStack>,

    /// Timestamp when the report was generated
    pub generated_at: String,
}

/// Write a run report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_report(report: &RunReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing run report to: {}", output_path.display());

    let file = create_output_file(output_path)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    Ok(())
}

/// Read a run report from a JSON file
///
/// **Public** - useful for tooling and testing
pub fn read_report(input_path: impl AsRef<Path>) -> Result<RunReport, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading run report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: RunReport =
        serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    Ok(report)
}
