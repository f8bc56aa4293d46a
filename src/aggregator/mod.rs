//! Aggregation of stack frames into folded stacks and metrics.
//!
//! This module transforms per-frame stack records into:
//! - Folded stack format (for flamegraph generation)
//! - Hot stack analysis (most sampled call chains)
//! - Sample distribution statistics

pub mod metrics;
pub mod stack_folder;

// Re-export main types and functions
pub use metrics::{
    calculate_hot_stacks, calculate_sample_distribution, generate_text_summary, HotStack,
    SampleDistribution,
};
pub use stack_folder::{FoldedStack, StackAggregator};
