//! SVG flamegraph generation from folded lines.

use crate::utils::error::FlamegraphError;
use log::info;

/// Flamegraph configuration
#[derive(Debug, Clone)]
pub struct FlamegraphConfig {
    pub title: String,
    /// Image width in pixels; inferno picks one when `None`
    pub width: Option<usize>,
    /// Draw the root at the top instead of the bottom
    pub inverted: bool,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            title: "Node.js CPU Profile".to_string(),
            width: None,
            inverted: false,
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }
}

/// Generate an SVG flamegraph from rendered folded lines
///
/// Accepts lines as produced by `StackAggregator::render` (with or without
/// the `\r\n` terminator).
///
/// # Errors
/// * `FlamegraphError::EmptyStacks` - nothing was folded
/// * `FlamegraphError::Render` - inferno failed to render
pub fn generate_flamegraph(
    lines: &[String],
    config: &FlamegraphConfig,
) -> Result<Vec<u8>, FlamegraphError> {
    if lines.is_empty() {
        return Err(FlamegraphError::EmptyStacks);
    }

    info!("Generating flamegraph with {} stacks", lines.len());

    let mut opts = inferno::flamegraph::Options::default();
    opts.title = config.title.clone();
    opts.count_name = "samples".to_string();
    opts.image_width = config.width;
    if config.inverted {
        opts.direction = inferno::flamegraph::Direction::Inverted;
    }

    let mut svg = Vec::new();
    inferno::flamegraph::from_lines(&mut opts, lines.iter().map(|l| l.trim_end()), &mut svg)
        .map_err(|e| FlamegraphError::Render(e.to_string()))?;

    info!("Flamegraph generated successfully ({} bytes)", svg.len());
    Ok(svg)
}
