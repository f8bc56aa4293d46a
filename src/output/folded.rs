//! Folded stack file writer.
//!
//! Lines are handed to a [`RecordSink`] one at a time; whenever the sink
//! reports saturation it is drained before the next line is written.

use super::create_output_file;
use crate::pipeline::{BufferedSink, RecordSink, SinkStatus};
use crate::utils::error::OutputError;
use log::{debug, info};
use std::io;
use std::path::Path;

/// Write rendered folded lines to a sink, honoring its backpressure
///
/// Returns the number of bytes written.
pub fn write_folded(lines: &[String], sink: &mut dyn RecordSink) -> io::Result<u64> {
    let mut written = 0u64;
    let mut drains = 0u32;

    for line in lines {
        written += line.len() as u64;
        if sink.write(line.as_bytes())? == SinkStatus::Saturated {
            sink.drain()?;
            drains += 1;
        }
    }

    sink.finish()?;
    debug!("Folded output: {} lines, {} drains", lines.len(), drains);
    Ok(written)
}

/// Write rendered folded lines to a file
///
/// **Public** - main entry point for folded output
///
/// # Errors
/// * `OutputError::InvalidPath` - Path is empty, a directory, or uncreatable
/// * `OutputError::WriteFailed` - I/O error during write
pub fn write_folded_file(lines: &[String], output_path: impl AsRef<Path>) -> Result<u64, OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing folded stacks to: {}", output_path.display());

    let file = create_output_file(output_path)?;
    let mut sink = BufferedSink::new(file);
    let written = write_folded(lines, &mut sink)?;

    info!("{} written ({} stacks, {} bytes)", output_path.display(), lines.len(), written);

    Ok(written)
}
