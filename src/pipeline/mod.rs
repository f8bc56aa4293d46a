//! Streaming pipeline: chunks → lines → records → resolver/aggregator.
//!
//! The [`Dispatcher`] is the run-scoped state. It is created when a stream
//! starts, fed every record in order and consumed by [`Dispatcher::finish`]
//! when the stream ends.

pub mod dispatcher;
pub mod stream;

// Re-export main types
pub use dispatcher::{Dispatcher, FoldResult, RunStats};
pub use stream::{run, BufferedSink, ChunkSource, MemorySource, ReaderSource, RecordSink, SinkStatus};
