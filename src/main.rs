//! spacehog - find what is eating your disk while the scan is still running.
//!
//! Usage:
//!   spacehog [PATH]                 Scan and print the largest files and directories
//!   spacehog [PATH] --live          Print progress while scanning
//!   spacehog [PATH] -o out.json     Also export the results to JSON
//!   spacehog --help                 Show help
//!
//! Ctrl-C stops the scan and prints whatever was found so far.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use futures::StreamExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use spacehog_core::{FileEntry, ScanError, ScanOptions, format_size};
use spacehog_ops::ScanSession;
use spacehog_scan::{ScanCoordinator, ScanEvent};

#[derive(Parser)]
#[command(
    name = "spacehog",
    version,
    about = "Find the largest files and directories on disk",
    long_about = "spacehog walks a directory tree and keeps a running list of the \
                  largest files and directories, so a useful answer is available \
                  long before the scan finishes."
)]
struct Cli {
    /// Path to analyze (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Number of largest files to keep
    #[arg(short = 'f', long, default_value = "10")]
    max_files: usize,

    /// Number of largest directories to keep
    #[arg(short = 'd', long, default_value = "10")]
    max_dirs: usize,

    /// Extra directory names to skip (repeatable)
    #[arg(short = 's', long = "skip", value_name = "NAME")]
    skip: Vec<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Print progress while scanning
    #[arg(long)]
    live: bool,

    /// Write the results as JSON to this file
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Cli {
    fn scan_options(&self) -> Result<ScanOptions, ScanError> {
        let mut options = ScanOptions::builder()
            .max_files(self.max_files)
            .max_dirs(self.max_dirs)
            .build()?;
        for name in &self.skip {
            options.skip_dir_names.insert(name.as_str().into());
        }
        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.debug);

    let options = cli.scan_options().context("Invalid options")?;
    debug!(?options, "scan options");
    let coordinator = Arc::new(ScanCoordinator::new(options));
    let mut session = ScanSession::for_coordinator(&coordinator, &cli.path);
    let root = session.root().to_path_buf();

    // Ctrl-C becomes a cooperative stop.
    let stop = coordinator.stop_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.cancel();
        }
    });

    eprintln!("Scanning {}...", root.display());

    if cli.live {
        let stream = coordinator.scan_async(&root).context("Scan failed")?;
        futures::pin_mut!(stream);
        while let Some(event) = stream.next().await {
            if let ScanEvent::Progress(progress) = &event {
                eprintln!(
                    " {:>5.1}%  {:>9} files  {:>12}",
                    progress.fraction * 100.0,
                    progress.files_scanned,
                    format_size(progress.total_bytes)
                );
            }
            session.apply_event(event);
        }
    } else {
        let scanner = Arc::clone(&coordinator);
        let scan_root = root.clone();
        let outcome = tokio::task::spawn_blocking(move || scanner.scan(&scan_root))
            .await
            .context("Scan task panicked")?
            .context("Scan failed")?;
        session.apply_outcome(outcome);
    }

    print_report(&session);

    if let Some(output) = &cli.output {
        session
            .export(output)
            .with_context(|| format!("Failed to export to {}", output.display()))?;
        eprintln!("Exported to {}", output.display());
    }

    Ok(())
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_report(session: &ScanSession) {
    if session.is_interrupted() {
        println!("Scan interrupted, showing partial results");
    }

    let total = session.total_bytes();
    print_table("Largest files", &session.visible_files(), total);
    print_table("Largest directories", &session.visible_dirs(), total);

    println!("{}", "─".repeat(70));
    println!(
        " {} - {} in {} files",
        session.root().display(),
        format_size(total),
        session.files_scanned()
    );
    let issues = session.access_issues();
    if !issues.is_empty() {
        println!(" {} path(s) could not be read", issues.len());
        for (path, error) in issues.iter().take(10) {
            println!("   {}: {}", path.display(), error);
        }
    }
    println!("{}", "─".repeat(70));
}

fn print_table(title: &str, entries: &[FileEntry], total: u64) {
    println!();
    println!(" {title}");
    println!("{}", "─".repeat(70));
    if entries.is_empty() {
        println!("   (none)");
    }
    for entry in entries {
        let ratio = if total > 0 {
            entry.size as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let marker = if entry.is_remote() { "☁" } else { " " };
        println!(
            " {} {:>10} {:>5.1}%  {}",
            marker,
            format_size(entry.size),
            ratio,
            entry.path.display()
        );
    }
    println!();
}
