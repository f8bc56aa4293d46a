//! etw-fold
//!
//! Folds stack-walk CSV dumps produced by `xperf` into the folded-stack
//! format consumed by flamegraph tools, resolving Node.js JIT frames
//! against the V8 code address maps recorded in the same trace.
//!
//! This crate provides the core implementation for the `etw-fold` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! xperf -i trace.etl -o trace.csv -symbols -a dumper
//! etw-fold trace.csv node.exe -o trace.fold
//! ```

pub mod aggregator;
pub mod commands;
pub mod flamegraph;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod utils;
