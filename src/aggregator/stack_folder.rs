//! Fold walked stack frames into counted call chains.
//!
//! Folded format: "outer;middle;leaf count"
//!
//! Example: "main;run;parse 12"
//! This means the sampled thread was in parse, called from run, called
//! from main, in 12 samples.
//!
//! Frame number 1 is the leaf of a sample. Frames arriving after the leaf
//! are one level closer to the root each and are prepended to the working
//! stack. Frames arriving before the leaf are outer frames listed root
//! first and are appended; the leaf then completes that sample at once.
//! A leaf arriving when the working stack already has one closes that
//! sample. Either way the key reads outermost first.

use crate::utils::config::{TargetProcess, LEAF_FRAME, UNKNOWN_SYMBOL};
use log::debug;
use std::collections::{HashMap, HashSet};

/// A single folded stack entry
///
/// **Public** - used by summaries and the flamegraph writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldedStack {
    /// Stack trace as semicolon-separated string
    pub stack: String,

    /// Number of samples with this exact stack
    pub count: u64,
}

impl FoldedStack {
    pub fn new(stack: String, count: u64) -> Self {
        Self { stack, count }
    }

    /// Folded-file line, terminated with `\r\n`
    pub fn to_line(&self) -> String {
        format!("{} {}\r\n", self.stack, self.count)
    }
}

/// Collects frames of the target process into a folded stack table
///
/// **Public** - owned by the run-scoped dispatcher
#[derive(Debug)]
pub struct StackAggregator {
    target: TargetProcess,
    /// Threads of the target process
    threads: HashSet<String>,
    /// Sample being assembled, outermost frame first
    pending: String,
    /// The pending sample already holds its frame-1 leaf
    pending_has_leaf: bool,
    stacks: HashMap<String, u64>,
    samples: u64,
}

impl StackAggregator {
    pub fn new(target: TargetProcess) -> Self {
        Self {
            target,
            threads: HashSet::new(),
            pending: String::new(),
            pending_has_leaf: false,
            stacks: HashMap::new(),
            samples: 0,
        }
    }

    pub fn target(&self) -> &TargetProcess {
        &self.target
    }

    /// Track `thread_id` if its process matches the target
    ///
    /// Returns true when the thread is (now) part of the filter.
    pub fn add_thread_filter(&mut self, process_name: &str, pid: &str, thread_id: &str) -> bool {
        if !self.target.matches(process_name, pid) {
            return false;
        }
        if self.threads.insert(thread_id.to_string()) {
            debug!("Folding stacks of thread {} ({} pid {})", thread_id, process_name, pid);
        }
        true
    }

    pub fn is_target_thread(&self, thread_id: &str) -> bool {
        self.threads.contains(thread_id)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Add one frame of a sample
    pub fn add_frame(&mut self, thread_id: &str, frame: &str, symbol: &str) {
        if !self.is_target_thread(thread_id) {
            return;
        }

        let is_leaf = frame == LEAF_FRAME;
        let unknown = symbol.starts_with(UNKNOWN_SYMBOL);

        if is_leaf {
            if self.pending_has_leaf {
                self.finalize();
            } else if !self.pending.is_empty() {
                // Root-first delivery: the leaf completes the sample
                if !unknown {
                    self.pending.push(';');
                    self.pending.push_str(&frame_name(symbol));
                }
                self.finalize();
                return;
            }
            self.pending_has_leaf = true;
        }

        if unknown {
            return;
        }

        let name = frame_name(symbol);
        if self.pending.is_empty() {
            self.pending = name;
        } else if self.pending_has_leaf {
            self.pending.insert(0, ';');
            self.pending.insert_str(0, &name);
        } else {
            self.pending.push(';');
            self.pending.push_str(&name);
        }
    }

    /// Count the sample being assembled, if any
    pub fn finalize(&mut self) {
        self.pending_has_leaf = false;
        if self.pending.is_empty() {
            return;
        }
        let stack = std::mem::take(&mut self.pending);
        *self.stacks.entry(stack).or_insert(0) += 1;
        self.samples += 1;
    }

    /// Folded lines sorted by their full text
    pub fn render(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .stacks
            .iter()
            .map(|(stack, &count)| format!("{} {}\r\n", stack, count))
            .collect();
        lines.sort();
        lines
    }

    /// Folded stacks sorted by count (descending), then by stack
    pub fn folded_stacks(&self) -> Vec<FoldedStack> {
        let mut stacks: Vec<FoldedStack> = self
            .stacks
            .iter()
            .map(|(stack, &count)| FoldedStack::new(stack.clone(), count))
            .collect();
        stacks.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.stack.cmp(&b.stack)));
        stacks
    }

    pub fn count(&self, stack: &str) -> Option<u64> {
        self.stacks.get(stack).copied()
    }

    /// Number of distinct folded stacks
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Number of samples counted so far
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Strip the `module!` qualifier and normalize path separators
///
/// **Private** - used by add_frame
fn frame_name(symbol: &str) -> String {
    let name = match symbol.find('!') {
        Some(bang) => &symbol[bang + 1..],
        None => symbol,
    };
    name.replace('\\', "/")
}
