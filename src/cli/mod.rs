//! # CLI Module
//!
//! Command-line interface for the driver store cleaner.
//!
//! ## Usage
//! ```bash
//! # Report superseded drivers without touching anything
//! driver-dedup scan
//!
//! # Against an offline Windows image
//! driver-dedup scan /mnt/windows/Windows
//!
//! # JSON output for scripting
//! driver-dedup scan --output json
//!
//! # Delete superseded drivers after confirmation
//! driver-dedup clean
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use driver_store_cleaner::core::cleanup::{run_cleanup_with_events, CleanupResult};
use driver_store_cleaner::core::pipeline::{Pipeline, PipelineResult};
use driver_store_cleaner::core::report::{export_to_file, CleanupReport, ExportFormat, ReportEntry};
use driver_store_cleaner::core::tool::{DeleteOutcome, PnpUtil};
use driver_store_cleaner::error::{DriverCleanerError, Result};
use driver_store_cleaner::events::{
    CorrelateEvent, DeleteEvent, EnumerateEvent, Event, EventChannel, EventReceiver,
    PipelineEvent,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::thread;

/// Driver Store Cleaner - reclaim space from superseded drivers
#[derive(Parser, Debug)]
#[command(name = "driver-dedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan the driver store and report what is reclaimable
    Scan {
        /// Windows installation root (defaults to the SystemRoot variable)
        system_root: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Write the full listing to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the full report to a JSON file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Scan, then delete superseded drivers after confirmation.
    ///
    /// Deletion goes through the system utility and needs an elevated
    /// console. Drivers still bound to an installed device are refused
    /// by the utility and kept.
    Clean {
        /// Windows installation root (defaults to the SystemRoot variable)
        system_root: Option<PathBuf>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (published names of reclaimable drivers only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    driver_store_cleaner::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            system_root,
            output,
            csv,
            json,
            verbose,
        } => run_scan(system_root, output, csv, json, verbose),
        Commands::Clean {
            system_root,
            yes,
            verbose,
        } => run_clean(system_root, yes, verbose),
    }
}

fn run_scan(
    system_root: Option<PathBuf>,
    output: OutputFormat,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(output, OutputFormat::Pretty);

    if pretty {
        print_header(&term);
    }

    let result = run_analysis(system_root, pretty, verbose)?;

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, verbose),
        OutputFormat::Json => print_json_results(&result),
        OutputFormat::Minimal => print_minimal_results(&result),
    }

    if let Some(path) = csv {
        write_export(&result.report, &path, ExportFormat::Csv)?;
        if pretty {
            term.write_line(&format!("Listing written to {}", path.display()))
                .ok();
        }
    }

    if let Some(path) = json {
        write_export(&result.report, &path, ExportFormat::Json)?;
        if pretty {
            term.write_line(&format!("Report written to {}", path.display()))
                .ok();
        }
    }

    if pretty {
        term.write_line("").ok();
        term.write_line(&format!(
            "{}",
            style("No drivers were deleted. Run `driver-dedup clean` to reclaim the space.")
                .dim()
        ))
        .ok();
    }

    Ok(())
}

fn run_clean(system_root: Option<PathBuf>, yes: bool, verbose: bool) -> Result<()> {
    let term = Term::stderr();
    print_header(&term);

    let result = run_analysis(system_root, true, verbose)?;
    print_pretty_results(&term, &result, verbose);

    let targets: Vec<ReportEntry> = result.report.reclaimable().cloned().collect();
    if targets.is_empty() {
        return Ok(());
    }

    if !yes {
        let prompt = format!(
            "Delete {} superseded driver folders ({})?",
            targets.len(),
            format_bytes(result.report.reclaimable_bytes)
        );
        if !confirm(&term, &prompt) {
            term.write_line("Nothing deleted.").ok();
            return Ok(());
        }
    }

    term.write_line("").ok();

    let tool = PnpUtil::new();
    let (sender, receiver) = EventChannel::new();

    let delete_term = term.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            print_delete_event(&delete_term, &event, verbose);
        }
    });

    // No cancellation source wired up here; the flag exists for
    // embedders driving the cleanup from their own UI.
    let cancel = AtomicBool::new(false);
    let outcome = run_cleanup_with_events(&tool, &targets, &cancel, &sender);

    drop(sender);
    event_thread.join().ok();

    print_cleanup_summary(&term, &outcome);

    Ok(())
}

/// Run the scan pipeline with a progress bar attached (pretty mode only).
fn run_analysis(
    system_root: Option<PathBuf>,
    pretty: bool,
    verbose: bool,
) -> Result<PipelineResult> {
    let mut builder = Pipeline::builder();
    if let Some(root) = system_root {
        builder = builder.system_root(root);
    }
    let pipeline = builder.build();

    let (sender, receiver) = EventChannel::new();

    let progress = if pretty {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let event_thread = spawn_progress_thread(receiver, progress, verbose);

    let result = pipeline.run_with_events(&sender);

    drop(sender);
    event_thread.join().ok();

    result
}

fn spawn_progress_thread(
    receiver: EventReceiver,
    progress: Option<ProgressBar>,
    verbose: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    if let Some(ref pb) = progress {
                        pb.set_message(phase.to_string());
                    }
                }
                Event::Enumerate(EnumerateEvent::Completed { total_drivers }) => {
                    if verbose {
                        if let Some(ref pb) = progress {
                            pb.println(format!("{total_drivers} staged drivers enumerated"));
                        }
                    }
                }
                Event::Correlate(CorrelateEvent::FoldersListed { total_folders }) => {
                    if let Some(ref pb) = progress {
                        pb.set_length(total_folders as u64);
                    }
                }
                Event::Correlate(CorrelateEvent::Progress(p)) => {
                    if let Some(ref pb) = progress {
                        pb.set_position(p.folders_seen as u64);
                        if verbose {
                            pb.set_message(format!(
                                "{} ({} resolved)",
                                p.current_path
                                    .file_name()
                                    .unwrap_or_default()
                                    .to_string_lossy(),
                                p.entries_resolved
                            ));
                        }
                    }
                }
                Event::Correlate(CorrelateEvent::Warning { message }) => {
                    if verbose {
                        if let Some(ref pb) = progress {
                            pb.println(format!("warning: {message}"));
                        }
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Error { .. }) => {
                    if let Some(ref pb) = progress {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    })
}

fn print_header(term: &Term) {
    term.write_line(&format!(
        "{} {}",
        style("Driver Store Cleaner").bold().cyan(),
        style("v0.1.0").dim()
    ))
    .ok();
    term.write_line("").ok();
}

fn print_pretty_results(term: &Term, result: &PipelineResult, verbose: bool) {
    term.write_line("").ok();
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} staged drivers enumerated in {:.1}s",
        style(result.total_drivers).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} store folders resolved",
        style(result.report.entries.len()).cyan()
    ))
    .ok();

    term.write_line(&format!(
        "  {} superseded drivers",
        style(result.superseded_drivers).cyan()
    ))
    .ok();

    term.write_line(&format!(
        "  {} reclaimable",
        style(format_bytes(result.report.reclaimable_bytes)).yellow()
    ))
    .ok();

    if !result.warnings.is_empty() {
        if verbose {
            for warning in &result.warnings {
                term.write_line(&format!(
                    "  {} {}",
                    style("!").yellow(),
                    style(warning).dim()
                ))
                .ok();
            }
        } else {
            term.write_line(&format!(
                "  {} warnings (rerun with --verbose to see them)",
                style(result.warnings.len()).yellow()
            ))
            .ok();
        }
    }

    term.write_line("").ok();

    if result.report.reclaimable_count() == 0 {
        term.write_line(&format!(
            "  {} No superseded drivers found!",
            style("🎉").green()
        ))
        .ok();
        return;
    }

    term.write_line(&format!(
        "{}",
        style("Duplicate drivers:").bold().underlined()
    ))
    .ok();
    term.write_line("").ok();

    let keepers: HashSet<&str> = result
        .report
        .reclaimable()
        .filter_map(|e| e.duplicate_of.as_deref())
        .collect();

    for entry in &result.report.entries {
        let is_keeper = keepers.contains(entry.published_name.as_str());
        if !entry.is_reclaimable() && !is_keeper && !verbose {
            continue;
        }

        let marker = if entry.is_reclaimable() {
            style("○").dim().to_string()
        } else if is_keeper {
            style("★").green().to_string()
        } else {
            style("·").dim().to_string()
        };

        term.write_line(&format!(
            "  {} {}  {}",
            marker,
            style(format!("{:>10}", format_bytes(entry.size_bytes))).cyan(),
            entry.describe()
        ))
        .ok();

        if let Some(canonical) = &entry.duplicate_of {
            term.write_line(&format!(
                "      {}",
                style(format!("superseded by {canonical}")).dim()
            ))
            .ok();
        }
        if verbose {
            term.write_line(&format!(
                "      {}",
                style(entry.folder_path.display()).dim()
            ))
            .ok();
        }
    }
}

fn print_json_results(result: &PipelineResult) {
    let output = serde_json::json!({
        "total_drivers": result.total_drivers,
        "superseded_drivers": result.superseded_drivers,
        "repository_entries": result.report.entries.len(),
        "reclaimable_entries": result.report.reclaimable_count(),
        "reclaimable_bytes": result.report.reclaimable_bytes,
        "duration_ms": result.duration_ms,
        "warnings": result.warnings,
        "entries": result.report.entries,
    });

    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

fn print_minimal_results(result: &PipelineResult) {
    for entry in result.report.reclaimable() {
        println!("{}", entry.published_name);
    }
}

fn print_delete_event(term: &Term, event: &Event, verbose: bool) {
    match event {
        Event::Delete(DeleteEvent::Started {
            total_entries,
            expected_bytes,
        }) => {
            term.write_line(&format!(
                "Deleting {} driver folders ({} expected)...",
                style(total_entries).cyan(),
                format_bytes(*expected_bytes)
            ))
            .ok();
        }
        Event::Delete(DeleteEvent::Outcome {
            published_name,
            outcome,
            size_bytes,
        }) => {
            let line = match outcome {
                DeleteOutcome::Deleted => format!(
                    "  {} {} ({})",
                    style("✓").green(),
                    published_name,
                    format_bytes(*size_bytes)
                ),
                DeleteOutcome::RefusedInUse => format!(
                    "  {} {} is in use, kept",
                    style("●").yellow(),
                    published_name
                ),
                DeleteOutcome::Failed { code, .. } => format!(
                    "  {} {} failed{}",
                    style("✗").red(),
                    published_name,
                    match code {
                        Some(c) => format!(" (exit code {c})"),
                        None => String::new(),
                    }
                ),
            };
            term.write_line(&line).ok();

            if verbose {
                if let DeleteOutcome::Failed { output, .. } = outcome {
                    for detail in output.lines() {
                        term.write_line(&format!("      {}", style(detail).dim())).ok();
                    }
                }
            }
        }
        _ => {}
    }
}

fn print_cleanup_summary(term: &Term, result: &CleanupResult) {
    let summary = &result.summary;

    term.write_line("").ok();
    term.write_line(&format!(
        "{} {} deleted, {} in use, {} failed",
        style("✓").green().bold(),
        summary.deleted,
        summary.refused_in_use,
        summary.failed
    ))
    .ok();
    term.write_line(&format!(
        "  {} reclaimed of {} expected",
        style(format_bytes(summary.reclaimed_bytes)).yellow(),
        format_bytes(summary.expected_bytes)
    ))
    .ok();
}

fn confirm(term: &Term, prompt: &str) -> bool {
    term.write_str(&format!("{prompt} [y/N] ")).ok();
    match term.read_line() {
        Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn write_export(report: &CleanupReport, path: &Path, format: ExportFormat) -> Result<()> {
    export_to_file(report, path, format).map_err(|e| DriverCleanerError::Export {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
