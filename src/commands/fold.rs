//! Fold command implementation.
//!
//! The fold command:
//! 1. Opens the input CSV (and the annotated CSV, if requested)
//! 2. Streams every record through the resolver and aggregator
//! 3. Writes the sorted folded stacks
//! 4. Optionally renders a flamegraph, a JSON report and a text summary

use crate::aggregator::{calculate_hot_stacks, calculate_sample_distribution, generate_text_summary};
use crate::flamegraph::{generate_flamegraph, FlamegraphConfig};
use crate::output::{create_output_file, write_folded_file, write_report, write_svg, RunReport};
use crate::pipeline::{run, BufferedSink, Dispatcher, ReaderSource, RecordSink, RunStats};
use crate::utils::config::{
    TargetProcess, DEFAULT_CHUNK_SIZE, DEFAULT_SUMMARY_STACKS, FOLD_EXTENSION, REPORT_VERSION,
};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Arguments for the fold command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct FoldArgs {
    /// xperf CSV to read
    pub input: PathBuf,

    /// Process whose stacks are folded
    pub target: TargetProcess,

    /// Folded stack output path
    pub output_fold: PathBuf,

    /// Annotated CSV output path (optional)
    pub output_csv: Option<PathBuf>,

    /// SVG flamegraph output path (optional)
    pub output_svg: Option<PathBuf>,

    /// Flamegraph configuration
    pub flamegraph_config: Option<FlamegraphConfig>,

    /// JSON run report output path (optional)
    pub report: Option<PathBuf>,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Number of hot stacks in the summary and report
    pub top_stacks: usize,

    /// Bytes read from the input per chunk
    pub chunk_size: usize,
}

impl FoldArgs {
    /// Defaults for `input`: target `node.exe`, output `<input>.fold`
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        Self {
            output_fold: default_fold_path(&input),
            input,
            target: TargetProcess::default(),
            output_csv: None,
            output_svg: None,
            flamegraph_config: None,
            report: None,
            print_summary: false,
            top_stacks: DEFAULT_SUMMARY_STACKS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// `<input>.fold`, keeping any existing extension
pub fn default_fold_path(input: &Path) -> PathBuf {
    let mut path = input.as_os_str().to_owned();
    path.push(".");
    path.push(FOLD_EXTENSION);
    PathBuf::from(path)
}

/// Execute the fold command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// Counters for the completed run
///
/// # Errors
/// * Input file cannot be opened or read
/// * Any output file cannot be created or written
pub fn execute_fold(args: &FoldArgs) -> Result<RunStats> {
    let start_time = Instant::now();

    info!("Folding stacks from: {}", args.input.display());
    info!(
        "Target {}: {}",
        if args.target.is_numeric_pid { "pid" } else { "process" },
        args.target.name_or_id
    );

    // Step 1: Open files
    info!("Step 1/4: Opening files...");
    let input = File::open(&args.input)
        .with_context(|| format!("Error reading file: {}", args.input.display()))?;
    let mut source = ReaderSource::with_chunk_size(input, args.chunk_size);

    let mut csv_sink = match &args.output_csv {
        Some(path) => {
            let file = create_output_file(path)
                .with_context(|| format!("Error writing to file: {}", path.display()))?;
            Some(BufferedSink::new(file))
        }
        None => None,
    };

    // Step 2: Stream records
    info!("Step 2/4: Resolving and folding stack records...");
    let mut dispatcher = Dispatcher::new(args.target.clone());
    run(
        &mut source,
        &mut dispatcher,
        csv_sink.as_mut().map(|sink| sink as &mut dyn RecordSink),
    )
    .with_context(|| format!("Failed to process {}", args.input.display()))?;

    if let Some(path) = &args.output_csv {
        info!("✓ Annotated CSV written to: {}", path.display());
    }

    let result = dispatcher.finish();
    let stats = result.stats;
    let aggregator = result.aggregator;

    debug!("Run stats: {:?}", stats);
    info!(
        "{} records, {} stack frames ({} resolved), {} contexts",
        stats.records, stats.stack_records, stats.resolved_frames, stats.contexts
    );
    if stats.malformed_records > 0 {
        warn!("{} malformed records passed through unresolved", stats.malformed_records);
    }
    if stats.target_threads == 0 {
        warn!(
            "No thread matched target '{}'; folded output will be empty",
            args.target.name_or_id
        );
    }

    // Step 3: Write folded stacks
    info!("Step 3/4: Writing folded stacks...");
    let lines = aggregator.render();
    write_folded_file(&lines, &args.output_fold)
        .with_context(|| format!("Error writing to file: {}", args.output_fold.display()))?;
    info!("✓ {} written", args.output_fold.display());

    // Step 4: Optional extras
    let stacks = aggregator.folded_stacks();

    if let Some(svg_path) = &args.output_svg {
        info!("Step 4/4: Generating flamegraph...");
        let config = args.flamegraph_config.clone().unwrap_or_default();
        if lines.is_empty() {
            warn!("No stacks folded, skipping flamegraph");
        } else {
            let svg = generate_flamegraph(&lines, &config).context("Failed to generate flamegraph")?;
            write_svg(&svg, svg_path).context("Failed to write flamegraph SVG")?;
            info!("✓ Flamegraph written to: {}", svg_path.display());
        }
    } else {
        debug!("Step 4/4: Skipping flamegraph generation (not requested)");
    }

    if let Some(report_path) = &args.report {
        let report = RunReport {
            version: REPORT_VERSION.to_string(),
            input: args.input.display().to_string(),
            target: args.target.name_or_id.clone(),
            target_is_pid: args.target.is_numeric_pid,
            folded_output: args.output_fold.display().to_string(),
            annotated_output: args.output_csv.as_ref().map(|p| p.display().to_string()),
            stats: stats.clone(),
            distribution: calculate_sample_distribution(&stacks),
            hot_stacks: calculate_hot_stacks(&stacks, stats.samples, args.top_stacks),
            generated_at: chrono::Utc::now().to_rfc3339(),
        };
        write_report(&report, report_path).context("Failed to write run report")?;
        info!("✓ Report written to: {}", report_path.display());
    }

    if args.print_summary {
        let distribution = calculate_sample_distribution(&stacks);
        println!("\n{}", "=".repeat(80));
        println!("FOLD SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Input:          {}", args.input.display());
        println!("Target:         {}", args.target.name_or_id);
        println!("Target Threads: {}", stats.target_threads);
        println!("Stack Frames:   {} ({} resolved)", stats.stack_records, stats.resolved_frames);
        println!("{}", distribution.summary());
        println!("\n{}", generate_text_summary(&stacks, args.top_stacks, stats.samples));
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Fold completed in {:.2}s", elapsed.as_secs_f64());

    Ok(stats)
}

/// Validate fold arguments
///
/// **Public** - can be called before execute_fold for early validation
pub fn validate_args(args: &FoldArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if !args.input.is_file() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    if args.target.name_or_id.is_empty() {
        anyhow::bail!("Target process name or pid cannot be empty");
    }

    if args.chunk_size == 0 {
        anyhow::bail!("chunk_size must be greater than 0");
    }

    if args.top_stacks == 0 {
        anyhow::bail!("top_stacks must be greater than 0");
    }

    if args.top_stacks > 1000 {
        anyhow::bail!("top_stacks is too large (max 1000)");
    }

    let outputs: Vec<&PathBuf> = std::iter::once(&args.output_fold)
        .chain(args.output_csv.iter())
        .chain(args.output_svg.iter())
        .chain(args.report.iter())
        .collect();

    for (i, output) in outputs.iter().enumerate() {
        if **output == args.input {
            anyhow::bail!("Output would overwrite the input: {}", output.display());
        }
        if outputs[..i].contains(output) {
            anyhow::bail!("Output path used twice: {}", output.display());
        }
    }

    Ok(())
}
