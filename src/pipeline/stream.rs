//! Chunked byte transport with sink backpressure.
//!
//! The input is pulled one chunk at a time from a [`ChunkSource`]. Lines
//! are dispatched as soon as they are complete and the (possibly rewritten)
//! record is written to an optional [`RecordSink`]. When the sink reports
//! [`SinkStatus::Saturated`], no further chunk is pulled until the sink has
//! been drained.

use super::dispatcher::Dispatcher;
use crate::parser::LineSplitter;
use crate::utils::config::{DEFAULT_CHUNK_SIZE, SINK_HIGH_WATER_MARK};
use crate::utils::error::PipelineError;
use log::debug;
use std::io::{self, Read, Write};

/// Pull-based producer of input chunks
pub trait ChunkSource {
    /// Next chunk of input, or `None` at end of stream
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>>;
}

/// Reads fixed-size chunks from any reader
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: vec![0; chunk_size.max(1)],
        }
    }
}

impl<R: Read> ChunkSource for ReaderSource<R> {
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        loop {
            match self.reader.read(&mut self.buffer) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(&self.buffer[..n])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Pre-split in-memory chunks
#[derive(Debug, Default)]
pub struct MemorySource {
    chunks: Vec<Vec<u8>>,
    next: usize,
}

impl MemorySource {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self { chunks, next: 0 }
    }

    /// Split `data` into chunks of at most `size` bytes
    pub fn fixed(data: &[u8], size: usize) -> Self {
        Self::new(data.chunks(size.max(1)).map(<[u8]>::to_vec).collect())
    }
}

impl ChunkSource for MemorySource {
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        let chunk = self.chunks.get(self.next).map(Vec::as_slice);
        if chunk.is_some() {
            self.next += 1;
        }
        Ok(chunk)
    }
}

/// Whether a sink can take more data without draining
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStatus {
    Ready,
    Saturated,
}

/// Backpressure-aware consumer of output bytes
pub trait RecordSink {
    /// Queue bytes, reporting whether the sink is now saturated
    fn write(&mut self, bytes: &[u8]) -> io::Result<SinkStatus>;

    /// Hand queued bytes to the underlying writer
    fn drain(&mut self) -> io::Result<()>;

    /// Drain and flush; called once at end of output
    fn finish(&mut self) -> io::Result<()>;
}

/// Sink that buffers up to a high-water mark before asking for a drain
#[derive(Debug)]
pub struct BufferedSink<W: Write> {
    writer: W,
    buffer: Vec<u8>,
    high_water_mark: usize,
}

impl<W: Write> BufferedSink<W> {
    pub fn new(writer: W) -> Self {
        Self::with_high_water_mark(writer, SINK_HIGH_WATER_MARK)
    }

    pub fn with_high_water_mark(writer: W, high_water_mark: usize) -> Self {
        Self {
            writer,
            buffer: Vec::new(),
            high_water_mark: high_water_mark.max(1),
        }
    }

    /// Bytes accepted but not yet handed to the writer
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for BufferedSink<W> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<SinkStatus> {
        self.buffer.extend_from_slice(bytes);
        if self.buffer.len() >= self.high_water_mark {
            Ok(SinkStatus::Saturated)
        } else {
            Ok(SinkStatus::Ready)
        }
    }

    fn drain(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.drain()?;
        self.writer.flush()
    }
}

/// Drive one input stream through the dispatcher
///
/// **Public** - main entry point for streaming
///
/// # Errors
/// * `PipelineError::Input` - reading a chunk failed
/// * `PipelineError::Output` - writing to the annotated sink failed
pub fn run(
    source: &mut dyn ChunkSource,
    dispatcher: &mut Dispatcher,
    mut sink: Option<&mut dyn RecordSink>,
) -> Result<(), PipelineError> {
    let mut splitter = LineSplitter::new();
    let mut paused = false;
    let mut chunks = 0u64;

    loop {
        if paused {
            if let Some(sink) = sink.as_deref_mut() {
                debug!("Output saturated after chunk {}, draining", chunks);
                sink.drain().map_err(PipelineError::Output)?;
            }
            dispatcher.record_pause();
            paused = false;
        }

        let Some(chunk) = source.next_chunk().map_err(PipelineError::Input)? else {
            break;
        };
        chunks += 1;

        splitter.push(chunk, |line| {
            if emit(dispatcher, sink.as_deref_mut(), line)? == SinkStatus::Saturated {
                paused = true;
            }
            Ok::<_, PipelineError>(())
        })?;
    }

    if let Some(line) = splitter.finish() {
        emit(dispatcher, sink.as_deref_mut(), &line)?;
    }

    if let Some(sink) = sink {
        sink.finish().map_err(PipelineError::Output)?;
    }

    debug!("Consumed {} chunks", chunks);
    Ok(())
}

/// Dispatch one line and forward the result to the sink
///
/// **Private** - internal helper for run
fn emit(
    dispatcher: &mut Dispatcher,
    sink: Option<&mut (dyn RecordSink + '_)>,
    line: &[u8],
) -> Result<SinkStatus, PipelineError> {
    let out = dispatcher.dispatch(line);
    match sink {
        Some(sink) => sink.write(&out).map_err(PipelineError::Output),
        None => Ok(SinkStatus::Ready),
    }
}
