//! Per-process resolver state and the registry that owns it.

use super::address_table::{AddressRange, AddressRangeTable};
use crate::utils::config::JS_MODULE;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Resolver state for one traced process
///
/// **Public** - created lazily by [`ContextRegistry::find_or_create`]
#[derive(Debug)]
pub struct Context {
    /// Process key as printed in the trace, e.g. `node.exe (1234)`
    process: String,
    threads: HashSet<String>,
    ranges: AddressRangeTable,
    source_files: HashMap<u64, String>,
}

impl Context {
    pub fn new(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            threads: HashSet::new(),
            ranges: AddressRangeTable::new(),
            source_files: HashMap::new(),
        }
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    pub fn threads(&self) -> &HashSet<String> {
        &self.threads
    }

    pub fn has_thread(&self, thread_id: &str) -> bool {
        self.threads.contains(thread_id)
    }

    /// Register a thread; returns false if it was already known
    pub fn add_thread(&mut self, thread_id: &str) -> bool {
        if self.has_thread(thread_id) {
            return false;
        }
        self.threads.insert(thread_id.to_string())
    }

    /// Map a source id to a file name, replacing any earlier mapping
    pub fn add_source_file(&mut self, source_id: u64, file_name: impl Into<String>) {
        self.source_files.insert(source_id, file_name.into());
    }

    pub fn source_file(&self, source_id: u64) -> Option<&str> {
        self.source_files.get(&source_id).map(String::as_str)
    }

    pub fn ranges(&self) -> &AddressRangeTable {
        &self.ranges
    }

    pub fn ranges_mut(&mut self) -> &mut AddressRangeTable {
        &mut self.ranges
    }

    pub fn add_range(&mut self, range: AddressRange) -> bool {
        self.ranges.add_range(range)
    }

    /// Forget all code ranges and source files; threads are kept
    pub fn reset(&mut self) {
        debug!(
            "Resetting {} ranges and {} source files for {}",
            self.ranges.len(),
            self.source_files.len(),
            self.process
        );
        self.ranges.reset();
        self.source_files.clear();
    }

    /// Resolve an address to `JavaScript!<symbol>[ <file>[:<line>]]`
    pub fn resolve(&mut self, address: u64) -> Option<String> {
        let range = self.ranges.lookup(address)?;
        let mut symbol = format!("{}{}", JS_MODULE, range.symbol);

        if range.source_id != 0 {
            if let Some(file) = self.source_files.get(&range.source_id) {
                symbol.push(' ');
                symbol.push_str(file);
                if let Some(line) = range.source_line {
                    symbol.push(':');
                    symbol.push_str(&line.to_string());
                }
            }
        }

        Some(symbol)
    }
}

/// All contexts seen during a run, indexed by process and by thread
///
/// **Public** - owned by the run-scoped dispatcher
#[derive(Debug, Default)]
pub struct ContextRegistry {
    contexts: Vec<Context>,
    by_process: HashMap<String, usize>,
    /// First context to register a thread id owns it
    by_thread: HashMap<String, usize>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the context for `process` and register `thread_id` in it
    pub fn find_or_create(&mut self, process: &str, thread_id: &str) -> &mut Context {
        let index = match self.by_process.get(process) {
            Some(&index) => index,
            None => {
                debug!("New resolver context for process {}", process);
                self.contexts.push(Context::new(process));
                let index = self.contexts.len() - 1;
                self.by_process.insert(process.to_string(), index);
                index
            }
        };

        let context = &mut self.contexts[index];
        if context.add_thread(thread_id) {
            self.by_thread.entry(thread_id.to_string()).or_insert(index);
        }
        context
    }

    /// Context owning `thread_id`, if any event registered it
    pub fn find_by_thread(&mut self, thread_id: &str) -> Option<&mut Context> {
        let index = *self.by_thread.get(thread_id)?;
        self.contexts.get_mut(index)
    }

    pub fn get(&self, process: &str) -> Option<&Context> {
        self.by_process
            .get(process)
            .map(|&index| &self.contexts[index])
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.contexts.iter()
    }

    /// Total ranges held across all contexts, removed ones included
    pub fn range_count(&self) -> usize {
        self.contexts.iter().map(|c| c.ranges().len()).sum()
    }
}
