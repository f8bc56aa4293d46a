//! Calculate sample metrics and hot stacks from folded data.
//!
//! Hot stacks are the call chains that were sampled most often.
//! These are the primary targets for optimization.

use super::stack_folder::FoldedStack;
use log::debug;
use serde::{Deserialize, Serialize};

/// A frequently sampled stack with its share of all samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotStack {
    pub stack: String,
    pub count: u64,
    /// Percentage of total samples
    pub percentage: f64,
}

/// Calculate hot stacks from folded stacks
///
/// **Public** - main entry point for metrics calculation
///
/// # Arguments
/// * `stacks` - Folded stacks sorted by count (descending)
/// * `total_samples` - Samples counted for the target process
/// * `top_n` - Number of top stacks to return
pub fn calculate_hot_stacks(
    stacks: &[FoldedStack],
    total_samples: u64,
    top_n: usize,
) -> Vec<HotStack> {
    debug!("Calculating top {} hot stacks from {} stacks", top_n, stacks.len());

    stacks
        .iter()
        .take(top_n)
        .map(|stack| HotStack {
            stack: stack.stack.clone(),
            count: stack.count,
            percentage: percentage(stack.count, total_samples),
        })
        .collect()
}

/// Calculate sample distribution statistics
///
/// **Public** - provides summary statistics
pub fn calculate_sample_distribution(stacks: &[FoldedStack]) -> SampleDistribution {
    if stacks.is_empty() {
        return SampleDistribution::default();
    }

    let total: u64 = stacks.iter().map(|s| s.count).sum();
    let count = stacks.len();

    let mut counts: Vec<u64> = stacks.iter().map(|s| s.count).collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));
    let median = counts[counts.len() / 2];

    // Top 10% of stacks
    let top_count = (count as f64 * 0.1).ceil() as usize;
    let top_samples: u64 = counts.iter().take(top_count).sum();

    let max_depth = stacks
        .iter()
        .map(|s| s.stack.split(';').count())
        .max()
        .unwrap_or(0);

    SampleDistribution {
        total_samples: total,
        stack_count: count,
        mean_samples_per_stack: total / count as u64,
        median_samples_per_stack: median,
        top_10_percent_samples: top_samples,
        top_10_percent_percentage: percentage(top_samples, total),
        max_depth,
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Sample distribution statistics
///
/// **Public** - returned from calculate_sample_distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleDistribution {
    /// Samples across all stacks
    pub total_samples: u64,

    /// Number of unique stacks
    pub stack_count: usize,

    pub mean_samples_per_stack: u64,

    pub median_samples_per_stack: u64,

    /// Samples in the top 10% of stacks
    pub top_10_percent_samples: u64,

    pub top_10_percent_percentage: f64,

    /// Deepest folded stack, in frames
    pub max_depth: usize,
}

impl SampleDistribution {
    /// Returns true if the top 10% of stacks hold more than 80% of samples
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > 80.0
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging
    pub fn summary(&self) -> String {
        format!(
            "Samples: {} | Stacks: {} | Mean: {} | Median: {} | Top 10%: {:.1}% | Max depth: {}",
            self.total_samples,
            self.stack_count,
            self.mean_samples_per_stack,
            self.median_samples_per_stack,
            self.top_10_percent_percentage,
            self.max_depth
        )
    }
}

/// Render a plain-text table of the hottest stacks
pub fn generate_text_summary(stacks: &[FoldedStack], max_lines: usize, total_samples: u64) -> String {
    let mut lines = Vec::new();

    lines.push(format!("  {:<60} {:>10} {:>7}", "Stack (hottest first)", "SAMPLES", "%"));
    lines.push(format!("  {}", "-".repeat(79)));

    for hot in calculate_hot_stacks(stacks, total_samples, max_lines) {
        // Keep the leaf end visible when truncating
        let display = if hot.stack.chars().count() > 60 {
            let tail: String = hot
                .stack
                .chars()
                .rev()
                .take(57)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("...{}", tail)
        } else {
            hot.stack.clone()
        };

        lines.push(format!("  {:<60} {:>10} {:>6.1}%", display, hot.count, hot.percentage));
    }

    if stacks.len() > max_lines {
        lines.push(String::new());
        lines.push(format!("  (Showing top {} of {} unique stacks)", max_lines, stacks.len()));
    }

    lines.join("\n")
}
