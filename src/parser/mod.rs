//! CSV record parsing for xperf stack dumps.
//!
//! This module handles:
//! - Reassembling lines from arbitrarily sized input chunks
//! - Extracting fixed-position fields (trimming, unquoting, hex/decimal)
//! - Classifying records by their leading field

pub mod fields;
pub mod line_splitter;
pub mod record;

// Re-export main types
pub use fields::{record_tag, Fields};
pub use line_splitter::LineSplitter;
pub use record::{
    classify, MethodLoadRecord, RecordKind, SourceLoadRecord, StackRecord, SymbolAction,
    SymbolRecord, ThreadRecord,
};
