//! Record classification and per-kind field layouts.
//!
//! Every record kind has a fixed field layout. Parsing only borrows from
//! the line; a record with a missing or malformed required field yields a
//! `RecordError` and is passed through by the dispatcher untouched.

use super::fields::Fields;
use crate::utils::config::{
    METHOD_LOAD_EVENT, PROVIDER_PREFIX, SOURCE_LOAD_EVENT, STACK_TAG, SYMBOL_MOVE_EVENT,
    SYMBOL_PADDING, SYMBOL_REMOVE_EVENT, SYMBOL_RESET_EVENT, THREAD_TAGS,
};
use crate::utils::error::RecordError;

/// What a record is, judged by its leading field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// One frame of a walked stack
    Stack,
    /// Thread start (or rundown) for a process
    Thread,
    /// Script source file declaration
    SourceLoad,
    /// JIT code range added
    MethodLoad,
    /// Address map reset, move or remove
    Symbol,
    /// Anything else, copied through as-is
    Other,
}

/// Classify a record from its tag (see [`crate::parser::record_tag`])
pub fn classify(tag: &str) -> RecordKind {
    if tag == STACK_TAG {
        RecordKind::Stack
    } else if THREAD_TAGS.contains(&tag) {
        RecordKind::Thread
    } else if tag.starts_with(SOURCE_LOAD_EVENT) {
        RecordKind::SourceLoad
    } else if tag.starts_with(METHOD_LOAD_EVENT) {
        RecordKind::MethodLoad
    } else if tag.starts_with(PROVIDER_PREFIX)
        && (tag == SYMBOL_RESET_EVENT || tag == SYMBOL_MOVE_EVENT || tag == SYMBOL_REMOVE_EVENT)
    {
        RecordKind::Symbol
    } else {
        RecordKind::Other
    }
}

/// `Stack, TimeStamp, ThreadID, No., Address, Image!Function, ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRecord<'a> {
    /// Fields 0..=4 verbatim, kept to rebuild the line
    pub head: [&'a str; 5],
    pub thread_id: &'a str,
    pub frame: &'a str,
    /// `None` when the address field is malformed; the frame still folds
    pub address: Option<u64>,
    /// Symbol text as printed by the profiler, quotes included
    pub symbol: &'a str,
}

impl<'a> StackRecord<'a> {
    pub fn parse(fields: &Fields<'a>) -> Result<Self, RecordError> {
        let head = [
            fields.raw(0)?,
            fields.raw(1)?,
            fields.raw(2)?,
            fields.raw(3)?,
            fields.raw(4)?,
        ];

        Ok(Self {
            head,
            thread_id: fields.trimmed(2)?,
            frame: fields.trimmed(3)?,
            address: fields.hex(4).ok(),
            symbol: fields.trimmed(5)?,
        })
    }

    /// Rebuild the record with `symbol` in place of the original symbol field
    pub fn rewrite(&self, symbol: &str) -> String {
        format!(
            "{}{}{}\r\n",
            self.head.join(","),
            SYMBOL_PADDING,
            symbol
        )
    }
}

/// `T-DCStart, TimeStamp, Process Name ( PID), ThreadID, ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRecord<'a> {
    pub process_name: &'a str,
    pub pid: &'a str,
    pub thread_id: &'a str,
}

impl<'a> ThreadRecord<'a> {
    pub fn parse(fields: &Fields<'a>) -> Result<Self, RecordError> {
        let (process_name, pid) = split_process(fields.trimmed(2)?);

        Ok(Self {
            process_name,
            pid,
            thread_id: fields.trimmed(3)?,
        })
    }
}

/// Split `name (pid)` into its name and pid parts
///
/// A process field without a parenthesised pid yields the whole text as the
/// name and an empty pid.
pub fn split_process(process: &str) -> (&str, &str) {
    let name = match process.find(" (") {
        Some(end) => &process[..end],
        None => process,
    };

    let pid = process
        .find('(')
        .and_then(|open| {
            let inner = &process[open + 1..];
            inner.find(')').map(|close| inner[..close].trim())
        })
        .unwrap_or("");

    (name, pid)
}

/// Source file declaration from the Node.js provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoadRecord<'a> {
    pub process: &'a str,
    pub thread_id: &'a str,
    pub source_id: u64,
    pub file_name: &'a str,
}

impl<'a> SourceLoadRecord<'a> {
    pub fn parse(fields: &Fields<'a>) -> Result<Self, RecordError> {
        Ok(Self {
            process: fields.trimmed(2)?,
            thread_id: fields.trimmed(3)?,
            source_id: fields.decimal(9)?,
            file_name: fields.unquoted(12)?,
        })
    }
}

/// JIT code range added by the Node.js provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodLoadRecord<'a> {
    pub process: &'a str,
    pub thread_id: &'a str,
    pub start: u64,
    pub stop: u64,
    /// 0 when the method has no source file
    pub source_id: u64,
    pub source_line: Option<u64>,
    pub symbol: &'a str,
}

impl<'a> MethodLoadRecord<'a> {
    pub fn parse(fields: &Fields<'a>) -> Result<Self, RecordError> {
        let start = fields.hex(10)?;
        let size = fields.number(11)?;
        let stop = start
            .checked_add(size)
            .ok_or(RecordError::RangeOverflow { start, size })?;

        Ok(Self {
            process: fields.trimmed(2)?,
            thread_id: fields.trimmed(3)?,
            start,
            stop,
            source_id: fields.decimal(15).unwrap_or(0),
            source_line: fields.decimal(16).ok(),
            symbol: fields.unquoted(18)?,
        })
    }
}

/// Change applied to a context's address ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolAction {
    Reset,
    Move { old_start: u64, new_start: u64 },
    Remove { old_start: u64 },
}

/// V8 symbol reset/move/remove event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord<'a> {
    pub process: &'a str,
    pub thread_id: &'a str,
    pub action: SymbolAction,
}

impl<'a> SymbolRecord<'a> {
    pub fn parse(tag: &str, fields: &Fields<'a>) -> Result<Self, RecordError> {
        let action = if tag == SYMBOL_MOVE_EVENT {
            SymbolAction::Move {
                old_start: fields.hex(9)?,
                new_start: fields.hex(10)?,
            }
        } else if tag == SYMBOL_REMOVE_EVENT {
            SymbolAction::Remove {
                old_start: fields.hex(9)?,
            }
        } else {
            SymbolAction::Reset
        };

        Ok(Self {
            process: fields.trimmed(2)?,
            thread_id: fields.trimmed(3)?,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method_load_line(start: &str, size: &str, symbol: &str) -> String {
        format!(
            "{}, 100, node.exe (1234), 5, 0, 0, 0, 0, 0, 0, {}, {}, 0, 0, 0, 7, 42, 0, {}\r\n",
            METHOD_LOAD_EVENT, start, size, symbol
        )
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("Stack"), RecordKind::Stack);
        assert_eq!(classify("T-DCStart"), RecordKind::Thread);
        assert_eq!(classify("T-Start"), RecordKind::Thread);
        assert_eq!(classify(SOURCE_LOAD_EVENT), RecordKind::SourceLoad);
        assert_eq!(classify(METHOD_LOAD_EVENT), RecordKind::MethodLoad);
        assert_eq!(
            classify("NodeJS-ETW-provider/MethodRuntime/MethodLoadVerbose"),
            RecordKind::MethodLoad
        );
        assert_eq!(classify(SYMBOL_RESET_EVENT), RecordKind::Symbol);
        assert_eq!(classify(SYMBOL_MOVE_EVENT), RecordKind::Symbol);
        assert_eq!(classify(SYMBOL_REMOVE_EVENT), RecordKind::Symbol);
        assert_eq!(
            classify("NodeJS-ETW-provider//NODE_GC_START"),
            RecordKind::Other
        );
        assert_eq!(classify("Stacks"), RecordKind::Other);
        assert_eq!(classify("P-Start"), RecordKind::Other);
    }

    #[test]
    fn test_stack_record() {
        let line = "Stack,   1000,   5,  2, 0x0000abcd, node.exe!foo\r\n";
        let record = StackRecord::parse(&Fields::split(line)).unwrap();
        assert_eq!(record.thread_id, "5");
        assert_eq!(record.frame, "2");
        assert_eq!(record.address, Some(0xabcd));
        assert_eq!(record.symbol, "node.exe!foo");
        assert_eq!(
            record.rewrite("JavaScript!bar"),
            "Stack,   1000,   5,  2, 0x0000abcd,         JavaScript!bar\r\n"
        );
    }

    #[test]
    fn test_stack_record_bad_address_still_parses() {
        let line = "Stack, 1, 5, 1, nothex, mod!foo\n";
        let record = StackRecord::parse(&Fields::split(line)).unwrap();
        assert_eq!(record.address, None);
    }

    #[test]
    fn test_stack_record_short() {
        let line = "Stack, 1, 5, 1\n";
        assert_eq!(
            StackRecord::parse(&Fields::split(line)),
            Err(RecordError::MissingField(4))
        );
    }

    #[test]
    fn test_thread_record() {
        let line = "T-DCStart,  , node.exe (1234),5\n";
        let record = ThreadRecord::parse(&Fields::split(line)).unwrap();
        assert_eq!(record.process_name, "node.exe");
        assert_eq!(record.pid, "1234");
        assert_eq!(record.thread_id, "5");
    }

    #[test]
    fn test_split_process() {
        assert_eq!(split_process("node.exe ( 1234)"), ("node.exe", "1234"));
        assert_eq!(split_process("Idle"), ("Idle", ""));
    }

    #[test]
    fn test_source_load_record() {
        let line = format!(
            "{}, 1, node.exe (1234), 5, 0, 0, 0, 0, 0, 7, 0, 0, \"C:\\app\\main.js\" \r\n",
            SOURCE_LOAD_EVENT
        );
        let record = SourceLoadRecord::parse(&Fields::split(&line)).unwrap();
        assert_eq!(record.process, "node.exe (1234)");
        assert_eq!(record.thread_id, "5");
        assert_eq!(record.source_id, 7);
        assert_eq!(record.file_name, "C:\\app\\main.js");
    }

    #[test]
    fn test_method_load_record() {
        let line = method_load_line("0x1000", "256", "\"LazyCompile:foo\"");
        let record = MethodLoadRecord::parse(&Fields::split(&line)).unwrap();
        assert_eq!(record.start, 0x1000);
        assert_eq!(record.stop, 0x1100);
        assert_eq!(record.source_id, 7);
        assert_eq!(record.source_line, Some(42));
        assert_eq!(record.symbol, "LazyCompile:foo");
    }

    #[test]
    fn test_method_load_hex_size() {
        let line = method_load_line("1000", "0x10", "foo");
        let record = MethodLoadRecord::parse(&Fields::split(&line)).unwrap();
        assert_eq!(record.stop, 0x1010);
    }

    #[test]
    fn test_method_load_overflow() {
        let line = method_load_line("0xffffffffffffffff", "2", "foo");
        assert!(matches!(
            MethodLoadRecord::parse(&Fields::split(&line)),
            Err(RecordError::RangeOverflow { .. })
        ));
    }

    #[test]
    fn test_symbol_records() {
        let mv = format!(
            "{}, 1, node.exe (1234), 5, 0, 0, 0, 0, 0, 0x1000, 0x2000\n",
            SYMBOL_MOVE_EVENT
        );
        let record = SymbolRecord::parse(SYMBOL_MOVE_EVENT, &Fields::split(&mv)).unwrap();
        assert_eq!(
            record.action,
            SymbolAction::Move {
                old_start: 0x1000,
                new_start: 0x2000
            }
        );

        let reset = format!("{}, 1, node.exe (1234), 5\n", SYMBOL_RESET_EVENT);
        let record = SymbolRecord::parse(SYMBOL_RESET_EVENT, &Fields::split(&reset)).unwrap();
        assert_eq!(record.action, SymbolAction::Reset);

        let remove = format!("{}, 1, node.exe (1234), 5\n", SYMBOL_REMOVE_EVENT);
        assert_eq!(
            SymbolRecord::parse(SYMBOL_REMOVE_EVENT, &Fields::split(&remove)),
            Err(RecordError::MissingField(9))
        );
    }
}
