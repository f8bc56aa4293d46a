//! Configuration and constants for the folder.

/// Leading field of a stack-frame record
pub const STACK_TAG: &str = "Stack";

/// Leading fields of thread-registration records
pub const THREAD_TAGS: &[&str] = &["T-DCStart", "T-Start"];

// Node.js ETW provider events carrying V8 code address maps
pub const PROVIDER_PREFIX: &str = "NodeJS-ETW-provider/";
pub const SOURCE_LOAD_EVENT: &str = "NodeJS-ETW-provider/ScriptContextRuntime/SourceLoad";
pub const METHOD_LOAD_EVENT: &str = "NodeJS-ETW-provider/MethodRuntime/MethodLoad";
pub const SYMBOL_RESET_EVENT: &str = "NodeJS-ETW-provider//NODE_V8SYMBOL_RESET";
pub const SYMBOL_MOVE_EVENT: &str = "NodeJS-ETW-provider//NODE_V8SYMBOL_MOVE";
pub const SYMBOL_REMOVE_EVENT: &str = "NodeJS-ETW-provider//NODE_V8SYMBOL_REMOVE";

/// Module qualifier prepended to resolved JavaScript frames
pub const JS_MODULE: &str = "JavaScript!";

/// Symbol text the profiler emits for frames it could not name
pub const UNKNOWN_SYMBOL: &str = "\"Unknown\"!";

/// Frame number of the innermost (leaf) frame in a sample
pub const LEAF_FRAME: &str = "1";

/// Padding written between the address field and a rewritten symbol
pub const SYMBOL_PADDING: &str = ",         ";

/// Process folded when no target is given on the command line
pub const DEFAULT_TARGET: &str = "node.exe";

/// Extension appended to the input path for the default folded output
pub const FOLD_EXTENSION: &str = "fold";

/// Bytes pulled from the input per read
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Buffered-but-unwritten bytes at which an output sink reports saturation
pub const SINK_HIGH_WATER_MARK: usize = 256 * 1024;

/// Number of stacks shown by `--summary` unless overridden
pub const DEFAULT_SUMMARY_STACKS: usize = 10;

/// Current JSON run report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Which process's threads feed the stack aggregator
///
/// **Public** - built by the command layer from CLI args
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetProcess {
    /// Executable name (lowercased) or decimal process id
    pub name_or_id: String,

    /// Match on pid instead of executable name
    pub is_numeric_pid: bool,
}

impl TargetProcess {
    /// Build a target from operator input; all-digit input selects pid mode
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let is_numeric_pid = !trimmed.is_empty() && trimmed.parse::<u64>().is_ok();

        Self {
            name_or_id: trimmed.to_lowercase(),
            is_numeric_pid,
        }
    }

    /// Match against a process name and pid taken from a thread record
    pub fn matches(&self, process_name: &str, pid: &str) -> bool {
        if self.is_numeric_pid {
            match (pid.trim().parse::<u64>(), self.name_or_id.parse::<u64>()) {
                (Ok(pid), Ok(target)) => pid == target,
                _ => false,
            }
        } else {
            process_name.to_lowercase() == self.name_or_id
        }
    }
}

impl Default for TargetProcess {
    fn default() -> Self {
        Self::parse(DEFAULT_TARGET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_name_mode_is_case_insensitive() {
        let target = TargetProcess::parse("Node.EXE");
        assert!(!target.is_numeric_pid);
        assert!(target.matches("node.exe", "1234"));
        assert!(target.matches("NODE.exe", "1"));
        assert!(!target.matches("chrome.exe", "1234"));
    }

    #[test]
    fn test_target_pid_mode() {
        let target = TargetProcess::parse("1234");
        assert!(target.is_numeric_pid);
        assert!(target.matches("anything.exe", "1234"));
        assert!(target.matches("anything.exe", " 1234 "));
        assert!(!target.matches("1234", "4321"));
        assert!(!target.matches("node.exe", ""));
    }

    #[test]
    fn test_default_target() {
        assert_eq!(TargetProcess::default().name_or_id, "node.exe");
    }
}
