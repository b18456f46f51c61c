/// VBA Analyzer - static analysis of VBA macro modules
///
/// The main entry point for the analyzer application. It parses command-line
/// arguments, analyzes each document and prints or exports the reports.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, LevelFilter};
use rayon::prelude::*;

use vba_analyzer::app::{self, DocumentReport};
use vba_analyzer::config::{self, AnalyzerConfig};
use vba_analyzer::utils::output_formatter;
use vba_analyzer::RuleRegistry;

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Report JSON, as read by downstream tools
    Json,
    /// Colored human-readable text
    Text,
}

/// Command line argument structure
#[derive(Parser, Debug)]
#[command(
    name = "vba_analyzer",
    version,
    about = "Static analysis of VBA macro modules",
    long_about = "Scans exported VBA modules (.bas, .cls, .frm, .vba), directories of exports \
or JSON module dumps for:
- Security risks (shell execution, file deletion, keystroke injection, ...)
- Performance anti-patterns (cell-by-cell loops, Select/Activate, ...)
- Code quality issues (long routines, missing comments, poor naming)"
)]
struct Args {
    /// Document(s) to analyze
    #[arg(name = "paths")]
    paths: Vec<String>,

    /// Console output format
    #[arg(long = "format", value_enum, default_value = "json")]
    format: OutputFormat,

    /// Wrap text output in markdown triple backticks
    #[arg(long = "md", action = ArgAction::SetTrue)]
    md: bool,

    /// Export reports to a JSON file
    #[arg(long = "json")]
    json: Option<String>,

    /// Export reports to an HTML file
    #[arg(long = "html")]
    html: Option<String>,

    /// Export findings to a CSV file
    #[arg(long = "csv")]
    csv: Option<String>,

    /// Suppress console output and the progress bar
    #[arg(long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,

    /// Show only summary information
    #[arg(long = "summary-only", action = ArgAction::SetTrue)]
    summary_only: bool,

    /// Attach plain-language insights to reports
    #[arg(long = "insights", action = ArgAction::SetTrue)]
    insights: bool,

    /// Path to configuration file
    #[arg(long = "config")]
    config: Option<String>,

    /// Number of parallel workers (0=auto, default: auto)
    #[arg(long = "parallel", default_value = "0")]
    parallel: usize,

    /// Analysis timeout in seconds per document (0 for none)
    #[arg(long = "timeout")]
    timeout: Option<u64>,

    /// Characters of module source kept in report previews
    #[arg(long = "preview-chars")]
    preview_chars: Option<usize>,

    /// Set logging level (default: WARN)
    #[arg(long = "log-level", default_value = "warn")]
    log_level: LevelFilter,

    /// Log file path (default: stderr)
    #[arg(long = "log-file")]
    log_file: Option<String>,
}

/// Main entry point function
fn main() {
    let args = Args::parse();

    setup_logging(&args);

    if args.paths.is_empty() {
        print_error("No file path provided");
        process::exit(1);
    }

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        print_error(&format!("{:#}", e));
        process::exit(1);
    }
}

/// Print the `{"error": ...}` object on stdout
fn print_error(message: &str) {
    println!("{}", serde_json::json!({ "error": message }));
}

/// Set up logging to stderr or to a log file
fn setup_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Set log level from arguments
    builder.filter_level(args.log_level);

    builder.format(|buf, record| {
        use chrono::Local;
        use std::io::Write;
        writeln!(
            buf,
            "{} - {} - {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(log_file) = &args.log_file {
        match File::create(log_file) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Cannot open log file {}: {}", log_file, e),
        }
    }

    builder.init();
}

/// Load configuration from file if provided, then apply flag overrides
fn load_config(args: &Args) -> Result<AnalyzerConfig> {
    let mut config = match &args.config {
        Some(path) => config::load_config(Path::new(path))?,
        None => config::default_config(),
    };

    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(preview_chars) = args.preview_chars {
        config.preview_chars = preview_chars;
    }
    if args.insights {
        config.insights = true;
    }

    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let config = load_config(args)?;

    // A broken rule set is fatal before any document is touched
    let registry = RuleRegistry::builtin()?;
    info!("Loaded {} rules", registry.len());

    let paths: Vec<PathBuf> = args.paths.iter().map(PathBuf::from).collect();
    let results = analyze_documents(&paths, &config, args)?;

    export_all_results(&results, args)?;

    if !args.quiet {
        print_results(&results, args);
    }

    info!(
        "Analyzed {} document(s) in {:.2} seconds",
        results.len(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Analyze documents on a sized pool, keeping input order
fn analyze_documents(
    paths: &[PathBuf],
    config: &AnalyzerConfig,
    args: &Args,
) -> Result<Vec<DocumentReport>> {
    let num_workers = if args.parallel == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        args.parallel
    };

    let progress_bar = if !args.quiet && paths.len() > 1 {
        let pb = ProgressBar::new(paths.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({eta})")
            .map_err(|e| anyhow!("Invalid progress template: {}", e))?
            .progress_chars("#>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .build()
        .map_err(|e| anyhow!("Failed to build thread pool: {}", e))?;

    let results: Result<Vec<DocumentReport>> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| -> Result<DocumentReport> {
                let report = app::analyze_with_deadline(path, config)?;
                if let Some(pb) = &progress_bar {
                    pb.inc(1);
                }
                Ok(DocumentReport {
                    document: path.to_string_lossy().to_string(),
                    report,
                })
            })
            .collect()
    });

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    results
}

/// Export results based on command line arguments
fn export_all_results(results: &[DocumentReport], args: &Args) -> Result<()> {
    if let Some(json_path) = &args.json {
        let json_path = Path::new(json_path);
        match results {
            [single] => output_formatter::export_report_json(&single.report, json_path)?,
            _ => output_formatter::export_report_json(results, json_path)?,
        }
        info!("Wrote JSON report to {}", json_path.display());
    }

    if let Some(html_path) = &args.html {
        output_formatter::create_html_report(results, Path::new(html_path))?;
        info!("Wrote HTML report to {}", html_path);
    }

    if let Some(csv_path) = &args.csv {
        output_formatter::create_csv_report(results, Path::new(csv_path))?;
        info!("Wrote CSV report to {}", csv_path);
    }

    Ok(())
}

fn print_results(results: &[DocumentReport], args: &Args) {
    if args.summary_only {
        println!("{}", output_formatter::create_summary(results));
        return;
    }

    match args.format {
        OutputFormat::Json => {
            let json = match results {
                [single] => output_formatter::to_json(&single.report),
                _ => output_formatter::to_json(results),
            };
            match json {
                Ok(json) => println!("{}", json),
                Err(e) => print_error(&e.to_string()),
            }
        }
        OutputFormat::Text => {
            for result in results {
                println!("{}", "=".repeat(80).bold());
                println!("{} {}", "Results for:".cyan(), result.document);
                println!("{}", "=".repeat(80).bold());
                println!("{}", output_formatter::format_report(&result.report, args.md));
            }
            if results.len() > 1 {
                println!("{}", output_formatter::create_summary(results));
            }
        }
    }
}
