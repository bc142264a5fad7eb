//! pricut-contours: CLI tool for contour extraction and diagnostics.
//!
//! Reads a drawing (JSON with `segments` and `polylines`, as produced by
//! a DXF flattener), runs the contour pipeline, and prints the ordered
//! contours with per-stage diagnostics. Useful for:
//!
//! - Checking that a drawing closes into cuttable figures
//! - Comparing start rules on drawings with shared vertices
//! - Inspecting area and cut length before quoting
//! - Rendering an SVG preview of what the cutter will follow
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin pricut-contours -- [OPTIONS] <DRAWING>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pricut_geometry::diagnostics::{Clock, PipelineDiagnostics, process_with_diagnostics};
use pricut_geometry::{ContourConfig, Drawing, ProcessResult, StartRule};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

/// Contour extraction and diagnostics for pricut drawings.
///
/// Orders the line geometry of a drawing into clockwise contours and
/// prints them with per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "pricut-contours", version)]
struct Cli {
    /// Path to the drawing JSON, or `-` for stdin.
    drawing: PathBuf,

    /// Start node of each component walk.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_START_RULE)]
    start_rule: Rule,

    /// Skip open contours instead of failing on them.
    #[arg(long)]
    allow_open: bool,

    /// Minimum distinct vertices for a closed contour to be a figure.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_MIN_FIGURE_VERTICES, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    min_vertices: usize,

    /// Write an SVG preview to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output contours and diagnostics as JSON instead of a report.
    #[arg(long)]
    json: bool,

    /// Full contour config as a JSON string.
    ///
    /// When provided, all other config flags are ignored. The JSON must
    /// be a valid `ContourConfig` serialization; missing fields take
    /// their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Log pipeline progress to stderr (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Start rule selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Rule {
    /// Smallest (x, y) node of the component.
    LowestPoint,
    /// First endpoint of the component's earliest segment.
    FirstEdge,
}

/// Maps a [`StartRule`] to the local CLI [`Rule`] enum.
const fn rule_from_config(rule: StartRule) -> Rule {
    match rule {
        StartRule::LowestPoint => Rule::LowestPoint,
        StartRule::FirstEdge => Rule::FirstEdge,
    }
}

/// The CLI default rule, derived from [`ContourConfig::DEFAULT_START_RULE`]
/// so the two cannot silently diverge.
const CLI_DEFAULT_START_RULE: Rule = rule_from_config(ContourConfig::DEFAULT_START_RULE);

/// Build a [`ContourConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual config flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<ContourConfig> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).context("parsing --config-json");
    }

    Ok(ContourConfig {
        start_rule: match cli.start_rule {
            Rule::LowestPoint => StartRule::LowestPoint,
            Rule::FirstEdge => StartRule::FirstEdge,
        },
        require_closed: !cli.allow_open,
        min_figure_vertices: cli.min_vertices,
    })
}

fn read_drawing(path: &std::path::Path) -> Result<Drawing> {
    let text = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading drawing from stdin")?
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing drawing {}", path.display()))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = config_from_cli(cli)?;
    let drawing = read_drawing(&cli.drawing)?;

    eprintln!(
        "Drawing: {} ({} segments, {} polylines)",
        cli.drawing.display(),
        drawing.segments.len(),
        drawing.polylines.len(),
    );
    eprintln!("Config: {config:?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);
    let mut last_result = None;

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }
        let (result, diagnostics) = process_with_diagnostics(&drawing, &config, &StdClock)
            .context("extracting contours")?;
        tracing::debug!(run, contours = result.contours.len(), "run complete");
        all_diagnostics.push(diagnostics);
        last_result = Some(result);
    }

    let (Some(result), Some(diagnostics)) = (last_result, all_diagnostics.last()) else {
        anyhow::bail!("no runs were executed");
    };

    if cli.json {
        let output = serde_json::json!({
            "contours": result.contours,
            "figures": result.figures,
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", diagnostics.report());
        println!();
        print_contours(&result);
    }

    if let Some(ref svg_path) = cli.svg {
        write_svg(cli, &config, &result, svg_path)?;
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    Ok(())
}

fn write_svg(
    cli: &Cli,
    config: &ContourConfig,
    result: &ProcessResult,
    svg_path: &std::path::Path,
) -> Result<()> {
    let title = cli
        .drawing
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("drawing");
    let desc = format!("{config:?}");
    let config_json = serde_json::to_string(config)?;
    let metadata = pricut_export::SvgMetadata {
        title: Some(title),
        description: Some(&desc),
        config_json: Some(&config_json),
    };
    let svg = pricut_export::to_svg(result, &metadata);
    std::fs::write(svg_path, &svg)
        .with_context(|| format!("writing SVG to {}", svg_path.display()))?;
    eprintln!(
        "SVG written to {} ({} bytes)",
        svg_path.display(),
        svg.len(),
    );
    Ok(())
}

/// Print each contour as one line of points.
fn print_contours(result: &ProcessResult) {
    for (i, contour) in result.contours.iter().enumerate() {
        let points: Vec<String> = contour.points().iter().map(ToString::to_string).collect();
        let state = if contour.is_closed() { "closed" } else { "open" };
        println!("#{i} [{state}, {:?}] {}", contour.winding(), points.join(" "));
    }
    for (i, figure) in result.figures.figures().iter().enumerate() {
        let kind = if figure.is_hole() { "hole" } else { "outline" };
        println!(
            "figure {i}: {kind} area={:.3} perimeter={:.3}",
            figure.area(),
            figure.perimeter(),
        );
    }
    println!(
        "net area={:.3} cut length={:.3}",
        result.figures.net_area(),
        result.figures.cut_length(),
    );
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Min, mean and max of a set of timings, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spread {
    min: f64,
    mean: f64,
    max: f64,
}

impl Spread {
    #[allow(clippy::cast_precision_loss)]
    fn of(durations: impl IntoIterator<Item = Duration>) -> Option<Self> {
        let mut count = 0_usize;
        let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
        for d in durations {
            let ms = d.as_secs_f64() * 1000.0;
            min = min.min(ms);
            max = max.max(ms);
            sum += ms;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(Self {
            min,
            mean: sum / count as f64,
            max,
        })
    }
}

/// Print min/mean/max timings for the whole pipeline and each stage.
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    let Some(first) = all_diagnostics.first() else {
        println!("Warning: no diagnostics to summarize");
        return;
    };

    println!();
    println!("Summary over {} runs", all_diagnostics.len());
    println!("{:<12} {:>10} {:>10} {:>10}", "", "min", "mean", "max");
    let row = |name: &str, spread: Option<Spread>| {
        if let Some(s) = spread {
            println!("{name:<12} {:>8.3}ms {:>8.3}ms {:>8.3}ms", s.min, s.mean, s.max);
        }
    };
    row("Total", Spread::of(all_diagnostics.iter().map(|d| d.total_duration)));
    for (index, (name, _)) in first.stages().into_iter().enumerate() {
        row(name, Spread::of(all_diagnostics.iter().map(|d| d.stages()[index].1.duration)));
    }
}
