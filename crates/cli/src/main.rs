//! CLI binary for fileconv.
//!
//! A thin shim over the core crate that maps flags to conversion requests,
//! runs them as one batch and prints the outcome.

use anyhow::{bail, Context, Result};
use clap::Parser;
use fileconv_core::{
    supported_targets, BatchResult, CancellationToken, ConversionOptions, ConversionRequest,
    Converter, EngineConfig, Format, DEFAULT_QUALITY,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a text file to PDF next to the source
  fileconv notes.txt --to pdf

  # Shrink photos into a 800x600 box and write JPEGs elsewhere
  fileconv *.png --to jpg --width 800 --height 600 --quality 80 -o out/

  # Spreadsheet to HTML table, machine-readable results
  fileconv report.xlsx --to html --json

  # Stop at the first file that cannot be converted
  fileconv a.csv b.csv c.csv --to xlsx --fail-fast

  # What can a file become?
  fileconv --list-targets data.csv

CONFIG FILE (--config):
  JSON with page layouts for PDF output, in points:
  {
    "text_layout":  { "page_width": 595.28, "page_height": 841.89, "margin": 50, "font_size": 12 },
    "table_layout": { "page_width": 595.28, "page_height": 841.89, "margin": 50, "font_size": 10 }
  }
"#;

/// Convert images, documents and spreadsheets between formats.
#[derive(Parser, Debug)]
#[command(
    name = "fileconv",
    version,
    about = "Convert images, documents and spreadsheets between formats",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to convert.
    files: Vec<PathBuf>,

    /// Target format (png, jpg, webp, pdf, html, txt, csv, xlsx, ...).
    #[arg(short, long, env = "FILECONV_TO", required_unless_present = "list_targets")]
    to: Option<String>,

    /// Write outputs here instead of beside each source.
    #[arg(short, long, env = "FILECONV_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// JPEG quality (1-100).
    #[arg(short, long, default_value_t = DEFAULT_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Maximum output width in pixels (images only, never upscales).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,

    /// Maximum output height in pixels (images only, never upscales).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,

    /// JSON file with page layout settings for PDF output.
    #[arg(long, env = "FILECONV_CONFIG")]
    config: Option<PathBuf>,

    /// Stop after the first file that fails; later files are not attempted.
    #[arg(long)]
    fail_fast: bool,

    /// Print the batch result as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Print the targets each input can be converted to, then exit.
    #[arg(long)]
    list_targets: bool,

    /// Show debug logs.
    #[arg(short, long)]
    verbose: bool,

    /// Only print errors.
    #[arg(long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", red("error:"), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // The progress bar is the feedback in the default mode; library logs
    // would interleave with it.
    let show_progress = !cli.quiet && !cli.json && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.list_targets {
        list_targets(&cli.files);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(target) = cli.to.as_deref() else {
        bail!("--to is required");
    };
    if cli.files.is_empty() {
        bail!("no input files given");
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let converter = Converter::new(config).context("Invalid engine configuration")?;

    let mut options = ConversionOptions::with_quality(cli.quality);
    options.width = cli.width;
    options.height = cli.height;

    let requests: Vec<ConversionRequest> = cli
        .files
        .iter()
        .map(|file| {
            let request = ConversionRequest::new(file, target).with_options(options);
            match &cli.output_dir {
                Some(dir) => request.with_output_dir(dir),
                None => request,
            }
        })
        .collect();

    let batch = run_batch(&converter, &requests, show_progress, cli.fail_fast);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    } else if !cli.quiet {
        print_results(&batch);
    }

    Ok(if batch.failure_count() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_batch(
    converter: &Converter,
    requests: &[ConversionRequest],
    show_progress: bool,
    fail_fast: bool,
) -> BatchResult {
    let bar = if show_progress {
        let bar = ProgressBar::new(requests.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Converting");
        bar
    } else {
        ProgressBar::hidden()
    };

    let cancel = CancellationToken::new();
    let batch = converter.convert_batch_with_progress(requests, &cancel, |p| {
        if fail_fast && !p.success {
            cancel.cancel();
        }
        bar.set_message(p.current_file);
        bar.set_position(p.completed as u64);
    });
    bar.finish_and_clear();
    batch
}

fn print_results(batch: &BatchResult) {
    for result in &batch.results {
        match (&result.output_path, &result.error) {
            (Some(output), _) => eprintln!(
                "  {} {} -> {}  {}",
                green("✓"),
                result.input_path.display(),
                output.display(),
                dim(&format!("{:.1}ms", result.duration.as_secs_f64() * 1000.0)),
            ),
            (None, error) => eprintln!(
                "  {} {}  {}",
                red("✗"),
                result.input_path.display(),
                red(error.as_deref().unwrap_or("unknown error")),
            ),
        }
    }

    let line = batch.summary();
    if batch.failure_count() == 0 {
        eprintln!("{} {}", green("✔"), line);
    } else {
        eprintln!("{} {}", red("✘"), line);
    }
}

fn list_targets(files: &[PathBuf]) {
    if files.is_empty() {
        for format in Format::all() {
            println!("{:<5} -> {}", format, join(format.targets()));
        }
        return;
    }

    for file in files {
        let ext = file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let targets = supported_targets(ext);
        if targets.is_empty() {
            println!("{}: {}", file.display(), red("no supported conversions"));
        } else {
            println!("{}: {}", file.display(), join(targets));
        }
    }
}

fn join(formats: &[Format]) -> String {
    formats
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
