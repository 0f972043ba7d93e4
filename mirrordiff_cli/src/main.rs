use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mirrordiff_common::{load_config, HashAlgo, LineCategory, ReportLine};
use mirrordiff_core::{CompareEngine, Progress, ReportSubscriber, RunStatus};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mirrordiff")]
#[command(author = "MirrorDiff Contributors")]
#[command(version = "0.1.0")]
#[command(
    about = "Verify that a tree of dataset containers matches its remote mirror",
    long_about = None
)]
struct Cli {
    /// Local tree root
    local: PathBuf,

    /// Remote mirror root
    remote: PathBuf,

    /// Number of parallel comparison workers (default: CPU count)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Hash algorithm for the whole-file check (blake3, sha256, md5)
    #[arg(long)]
    hash: Option<HashAlgo>,

    /// Report file path
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Relative tolerance for structural dataset comparison
    #[arg(long)]
    rtol: Option<f64>,

    /// Absolute tolerance for structural dataset comparison
    #[arg(long)]
    atol: Option<f64>,

    /// Aggregate byte-size tolerance for the global precheck, in megabytes
    #[arg(long)]
    size_tolerance_mb: Option<u64>,

    /// Skip the external diff tool and go straight to the structural compare
    #[arg(long)]
    no_external_diff: bool,

    /// External diff command invoked as `<command> <local> <remote>`
    #[arg(long)]
    external_diff_command: Option<String>,

    /// File extension (without dot) selecting files for comparison
    #[arg(long)]
    extension: Option<String>,

    /// Ignore patterns (can be specified multiple times)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Print a JSON summary to stdout instead of echoing report lines
    #[arg(long)]
    json: bool,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() {
    // Initialize tracing to stderr (so report and JSON output can go
    // cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(RunStatus::Completed) => 0,
        Ok(RunStatus::PrecheckFailed) => 2,
        Ok(RunStatus::Aborted) => 130,
        Err(e) => {
            error!("Comparison failed: {}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<RunStatus> {
    if !cli.local.exists() {
        anyhow::bail!("Local path does not exist: {}", cli.local.display());
    }
    if !cli.remote.exists() {
        anyhow::bail!("Remote path does not exist: {}", cli.remote.display());
    }

    let loaded = load_config(false).context("Failed to load configuration")?;
    let mut config = loaded.config;

    if let Some(workers) = cli.workers {
        config.worker_count = workers;
    }
    if let Some(hash) = cli.hash {
        config.hash_algo = hash;
    }
    if let Some(report) = cli.report.clone() {
        config.report_path = report;
    }
    if let Some(rtol) = cli.rtol {
        config.rtol = rtol;
    }
    if let Some(atol) = cli.atol {
        config.atol = atol;
    }
    if let Some(mb) = cli.size_tolerance_mb {
        config.size_tolerance_bytes = mb * 1024 * 1024;
    }
    if cli.no_external_diff {
        config.use_external_diff = false;
    }
    if let Some(command) = cli.external_diff_command.clone() {
        config.external_diff_command = command;
    }
    if let Some(extension) = cli.extension.clone() {
        config.target_extension = extension;
    }
    if !cli.ignore.is_empty() {
        config.ignore_patterns.extend(cli.ignore.clone());
    }
    if cli.follow_symlinks {
        config.follow_symlinks = true;
    }

    let report_path = config.report_path.clone();
    let mut engine = CompareEngine::new(config);

    // Termination signals take the same path as a user cancel
    let abort = engine.abort_token();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, stopping comparison...");
        abort.request_abort();
    })
    .context("Failed to set signal handler")?;

    let counts = Arc::new(Mutex::new(CategoryCounts::default()));
    let mut bar = None;

    if cli.json {
        engine.add_subscriber(Box::new(TallySubscriber {
            counts: counts.clone(),
        }));
    } else {
        let show_bar = !cli.no_progress && std::io::stderr().is_terminal();
        bar = show_bar.then(make_progress_bar);
        engine.add_subscriber(Box::new(ConsoleSubscriber {
            bar: bar.clone(),
            progress: engine.progress(),
        }));
    }

    let status = engine.run(&cli.local, &cli.remote)?;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    if cli.json {
        let summary = JsonSummary {
            status: status_name(status),
            report_path: report_path.display().to_string(),
            counts: counts.lock().unwrap().clone(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(status)
}

fn make_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.green} {pos}/{len} {msg}")
            .expect("Invalid progress template"),
    );
    bar
}

fn status_name(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Completed => "completed",
        RunStatus::PrecheckFailed => "precheck_failed",
        RunStatus::Aborted => "aborted",
    }
}

/// Echoes report lines to stdout, keeping the progress bar intact
struct ConsoleSubscriber {
    bar: Option<ProgressBar>,
    progress: Progress,
}

impl ReportSubscriber for ConsoleSubscriber {
    fn on_line(&mut self, line: &ReportLine) {
        let (completed, total) = self.progress.snapshot();
        match &self.bar {
            Some(bar) => {
                if bar.length() != Some(total) {
                    bar.set_length(total);
                }
                bar.set_position(completed);
                bar.println(line.to_string());
            }
            None => println!("{}", line),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
struct CategoryCounts {
    ok: u64,
    different: u64,
    different_size: u64,
    missing_on_local: u64,
    missing_on_remote: u64,
    errors: u64,
    aborted: u64,
}

/// Tallies line categories for the JSON summary
struct TallySubscriber {
    counts: Arc<Mutex<CategoryCounts>>,
}

impl ReportSubscriber for TallySubscriber {
    fn on_line(&mut self, line: &ReportLine) {
        let mut counts = self.counts.lock().unwrap();
        match line.category {
            LineCategory::Ok => counts.ok += 1,
            LineCategory::Different => counts.different += 1,
            LineCategory::DifferentSize => counts.different_size += 1,
            LineCategory::MissingOnLocal => counts.missing_on_local += 1,
            LineCategory::MissingOnRemote => counts.missing_on_remote += 1,
            LineCategory::Error => counts.errors += 1,
            LineCategory::Aborted => counts.aborted += 1,
            LineCategory::Info => {}
        }
    }
}

#[derive(Serialize)]
struct JsonSummary {
    status: &'static str,
    report_path: String,
    counts: CategoryCounts,
}
