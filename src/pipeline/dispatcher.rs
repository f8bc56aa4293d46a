//! Route each record to its handler.
//!
//! Handlers never fail the run. A record with a missing or malformed
//! required field is counted, logged at debug level and passed through
//! unmodified.

use crate::aggregator::StackAggregator;
use crate::parser::{
    classify, record_tag, Fields, MethodLoadRecord, RecordKind, SourceLoadRecord, StackRecord,
    SymbolAction, SymbolRecord, ThreadRecord,
};
use crate::resolver::{AddressRange, ContextRegistry};
use crate::utils::config::TargetProcess;
use crate::utils::error::RecordError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Lines seen, including pass-through ones
    pub records: u64,
    pub stack_records: u64,
    /// Stack frames rewritten with a JavaScript symbol
    pub resolved_frames: u64,
    pub unresolved_frames: u64,
    pub thread_records: u64,
    pub source_files: u64,
    pub ranges_added: u64,
    pub duplicate_ranges: u64,
    pub ranges_moved: u64,
    pub ranges_removed: u64,
    pub resets: u64,
    /// Recognized records that failed to parse
    pub malformed_records: u64,
    /// Times the producer waited on a saturated sink
    pub pauses: u64,
    pub contexts: usize,
    pub target_threads: usize,
    pub samples: u64,
    pub distinct_stacks: usize,
}

/// What is left of a run once the stream has ended
#[derive(Debug)]
pub struct FoldResult {
    pub aggregator: StackAggregator,
    pub stats: RunStats,
}

/// Run-scoped record dispatcher
///
/// **Public** - created per input stream by the command layer
#[derive(Debug)]
pub struct Dispatcher {
    registry: ContextRegistry,
    aggregator: StackAggregator,
    stats: RunStats,
}

impl Dispatcher {
    pub fn new(target: TargetProcess) -> Self {
        Self {
            registry: ContextRegistry::new(),
            aggregator: StackAggregator::new(target),
            stats: RunStats::default(),
        }
    }

    /// Process one line and return the line to write to the annotated CSV
    ///
    /// The returned bytes borrow `line` unless a stack frame was resolved.
    pub fn dispatch<'a>(&mut self, line: &'a [u8]) -> Cow<'a, [u8]> {
        self.stats.records += 1;

        let text = String::from_utf8_lossy(line);
        let tag = record_tag(&text);
        let kind = classify(tag);
        if kind == RecordKind::Other {
            return Cow::Borrowed(line);
        }

        let fields = Fields::split(&text);
        let result = match kind {
            RecordKind::Stack => self.handle_stack(&fields),
            RecordKind::Thread => self.handle_thread(&fields).map(|_| None),
            RecordKind::SourceLoad => self.handle_source_load(&fields).map(|_| None),
            RecordKind::MethodLoad => self.handle_method_load(&fields).map(|_| None),
            RecordKind::Symbol => self.handle_symbol(tag, &fields).map(|_| None),
            RecordKind::Other => Ok(None),
        };

        match result {
            Ok(Some(rewritten)) => Cow::Owned(rewritten.into_bytes()),
            Ok(None) => Cow::Borrowed(line),
            Err(e) => {
                self.stats.malformed_records += 1;
                debug!("Passing through malformed {:?} record: {}", kind, e);
                Cow::Borrowed(line)
            }
        }
    }

    fn handle_stack(&mut self, fields: &Fields) -> Result<Option<String>, RecordError> {
        let record = StackRecord::parse(fields)?;
        self.stats.stack_records += 1;

        let resolved = match (self.registry.find_by_thread(record.thread_id), record.address) {
            (Some(context), Some(address)) => context.resolve(address),
            _ => None,
        };

        if resolved.is_some() {
            self.stats.resolved_frames += 1;
        } else {
            self.stats.unresolved_frames += 1;
        }

        let symbol = resolved.as_deref().unwrap_or(record.symbol);
        self.aggregator
            .add_frame(record.thread_id, record.frame, symbol);

        Ok(resolved.as_deref().map(|s| record.rewrite(s)))
    }

    fn handle_thread(&mut self, fields: &Fields) -> Result<(), RecordError> {
        let record = ThreadRecord::parse(fields)?;
        self.stats.thread_records += 1;
        self.aggregator
            .add_thread_filter(record.process_name, record.pid, record.thread_id);
        Ok(())
    }

    fn handle_source_load(&mut self, fields: &Fields) -> Result<(), RecordError> {
        let record = SourceLoadRecord::parse(fields)?;
        self.stats.source_files += 1;
        self.registry
            .find_or_create(record.process, record.thread_id)
            .add_source_file(record.source_id, record.file_name);
        Ok(())
    }

    fn handle_method_load(&mut self, fields: &Fields) -> Result<(), RecordError> {
        let record = MethodLoadRecord::parse(fields)?;
        let range = AddressRange::new(record.symbol, record.start, record.stop)
            .with_source(record.source_id, record.source_line);

        let added = self
            .registry
            .find_or_create(record.process, record.thread_id)
            .add_range(range);

        if added {
            self.stats.ranges_added += 1;
        } else {
            self.stats.duplicate_ranges += 1;
        }
        Ok(())
    }

    fn handle_symbol(&mut self, tag: &str, fields: &Fields) -> Result<(), RecordError> {
        let record = SymbolRecord::parse(tag, fields)?;
        let context = self.registry.find_or_create(record.process, record.thread_id);

        match record.action {
            SymbolAction::Reset => {
                context.reset();
                self.stats.resets += 1;
            }
            SymbolAction::Move {
                old_start,
                new_start,
            } => {
                if context.ranges_mut().move_range(old_start, new_start) {
                    self.stats.ranges_moved += 1;
                }
            }
            SymbolAction::Remove { old_start } => {
                if context.ranges_mut().remove(old_start) {
                    self.stats.ranges_removed += 1;
                }
            }
        }
        Ok(())
    }

    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    pub fn aggregator(&self) -> &StackAggregator {
        &self.aggregator
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub(crate) fn record_pause(&mut self) {
        self.stats.pauses += 1;
    }

    /// End of stream: count the last sample and tear down resolver state
    pub fn finish(mut self) -> FoldResult {
        self.aggregator.finalize();

        let mut stats = self.stats;
        stats.contexts = self.registry.len();
        stats.target_threads = self.aggregator.thread_count();
        stats.samples = self.aggregator.samples();
        stats.distinct_stacks = self.aggregator.len();

        debug!(
            "Run finished: {} contexts holding {} ranges",
            stats.contexts,
            self.registry.range_count()
        );

        FoldResult {
            aggregator: self.aggregator,
            stats,
        }
    }
}
