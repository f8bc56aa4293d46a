//! Flamegraph generation using the inferno library.
//!
//! This module converts folded stacks into interactive SVG flamegraphs.

pub mod generator;

// Re-export main types
pub use generator::{generate_flamegraph, FlamegraphConfig};
