//! CLI command implementations.
//!
//! Commands orchestrate the various library components to perform user tasks.

pub mod fold;

// Re-export main command functions
pub use fold::{default_fold_path, execute_fold, validate_args, FoldArgs};
