//! etw-fold CLI
//!
//! Converts xperf stack CSV into folded stacks for flamegraph generation,
//! resolving JavaScript frames from Node.js ETW events.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;

use etw_fold::commands::{execute_fold, validate_args, FoldArgs};
use etw_fold::flamegraph::FlamegraphConfig;
use etw_fold::utils::config::{
    TargetProcess, DEFAULT_CHUNK_SIZE, DEFAULT_SUMMARY_STACKS, DEFAULT_TARGET,
};

/// Fold xperf stack CSV into flamegraph input
#[derive(Parser, Debug)]
#[command(name = "etw-fold")]
#[command(version, about, long_about = None)]
struct Cli {
    /// CSV file generated by xperf using stackwalk and symbols
    input: PathBuf,

    /// Executable name or process id whose stacks to fold
    #[arg(default_value = DEFAULT_TARGET)]
    target: String,

    /// Folded stack output [default: <INPUT>.fold]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a copy of the CSV with JavaScript names resolved in stacks
    #[arg(short = 's', long = "symbolized-csv")]
    symbolized_csv: Option<PathBuf>,

    /// Output path for SVG flamegraph (optional)
    #[arg(long)]
    flamegraph: Option<PathBuf>,

    /// Flamegraph title
    #[arg(long)]
    title: Option<String>,

    /// Flamegraph width in pixels
    #[arg(long)]
    width: Option<usize>,

    /// Draw the flamegraph root at the top
    #[arg(long)]
    inverted: bool,

    /// Output path for a JSON run report (optional)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print text summary to stdout
    #[arg(long)]
    summary: bool,

    /// Number of hot stacks in the summary and report
    #[arg(long, default_value_t = DEFAULT_SUMMARY_STACKS)]
    top: usize,

    /// Bytes read from the input at a time
    #[arg(long, env = "ETW_FOLD_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let flamegraph_config = if cli.flamegraph.is_some() {
        let mut config = FlamegraphConfig::new().with_inverted(cli.inverted);
        if let Some(title) = cli.title {
            config = config.with_title(title);
        }
        if let Some(width) = cli.width {
            config = config.with_width(width);
        }
        Some(config)
    } else {
        None
    };

    let mut args = FoldArgs::new(cli.input);
    args.target = TargetProcess::parse(&cli.target);
    if let Some(output) = cli.output {
        args.output_fold = output;
    }
    args.output_csv = cli.symbolized_csv;
    args.output_svg = cli.flamegraph;
    args.flamegraph_config = flamegraph_config;
    args.report = cli.report;
    args.print_summary = cli.summary;
    args.top_stacks = cli.top;
    args.chunk_size = cli.chunk_size;

    // Validate args first
    validate_args(&args)?;

    execute_fold(&args)?;

    Ok(())
}
