//! Pipeline orchestration
//!
//! Coordinates dataset discovery, parallel analysis, and report export.
//! Each dataset is an independent engine invocation, so datasets are analyzed
//! in parallel on the rayon pool while the engine itself stays single-threaded.

use crate::catalog::{self, DatasetFile};
use crate::config::Settings;
use crate::engine::{analyze, AnalysisRequest};
use crate::error::{Result, StatsError};
use crate::export::{self, IndexEntry, ReportJson};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Pipeline result summary
#[derive(Debug)]
pub struct PipelineResult {
    pub total_datasets: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Run the full analysis pipeline
pub fn run(settings: &Settings) -> Result<PipelineResult> {
    let pipeline_start = Instant::now();

    // Argument errors in the request are fatal for the whole run
    let request = settings.analysis_request()?;

    configure_thread_pool(settings.threads)?;

    // Phase 1: Discovery
    info!("Scanning for datasets...");
    let files = catalog::scan(&settings.input, settings.recursive)?;

    if files.is_empty() {
        return Ok(PipelineResult {
            total_datasets: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
        });
    }

    if settings.dry_run {
        return run_dry_run(&files, settings);
    }

    // Phase 2: Analysis
    let analysis_start = Instant::now();
    let (reports, stats) = analyze_datasets(&files, &request, settings);
    info!(
        "Analysis completed in {:.2}s",
        analysis_start.elapsed().as_secs_f64()
    );

    // Phase 3: Export
    if !reports.is_empty() {
        export_reports(&reports, settings)?;
    }

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(PipelineResult {
        total_datasets: files.len(),
        successful: stats.successful,
        failed: stats.failed,
        skipped: stats.skipped,
    })
}

/// Dry run mode - list datasets and planned reports without processing
fn run_dry_run(files: &[DatasetFile], settings: &Settings) -> Result<PipelineResult> {
    println!();
    println!("=== DRY RUN MODE ===");
    println!();

    let total_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();
    for file in files {
        println!("  {:<32} {:>10} bytes  {}", file.id, file.size_bytes, file.path.display());
    }
    println!();
    println!(
        "Would analyze {} datasets ({} bytes) over {} features",
        files.len(),
        total_bytes,
        settings.features.len()
    );
    if let Some(field) = &settings.group_by {
        println!("Grouping by '{}'", field);
    }

    println!();
    println!("Would create:");
    for file in files {
        println!("  {}", report_path(settings, &file.id).display());
    }
    println!("  {}", settings.output.join("index.json").display());
    println!();

    Ok(PipelineResult {
        total_datasets: files.len(),
        successful: 0,
        failed: 0,
        skipped: files.len(),
    })
}

/// Configure the Rayon thread pool
fn configure_thread_pool(num_threads: usize) -> Result<()> {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(()) => {
            debug!("Configured thread pool with {} threads", num_threads);
        }
        Err(e) => {
            // If the pool is already initialized (e.g., in tests), that's OK
            if e.to_string().contains("already been initialized") {
                debug!("Thread pool already initialized, using existing pool");
            } else {
                return Err(StatsError::ConfigError(format!(
                    "Failed to configure thread pool: {}",
                    e
                )));
            }
        }
    }
    Ok(())
}

/// Analysis statistics
struct AnalysisStats {
    successful: usize,
    failed: usize,
    skipped: usize,
}

/// Analyze every dataset in parallel, collecting reports in discovery order
fn analyze_datasets(
    files: &[DatasetFile],
    request: &AnalysisRequest,
    settings: &Settings,
) -> (Vec<ReportJson>, AnalysisStats) {
    let progress_bar = if settings.show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(0);

    let reports: Vec<ReportJson> = files
        .par_iter()
        .filter_map(|file| {
            let result = analyze_single_dataset(file, request, settings);

            if let Some(ref pb) = progress_bar {
                pb.inc(1);
                pb.set_message(file.id.clone());
            }

            match result {
                Ok(report) => {
                    successful.fetch_add(1, Ordering::Relaxed);
                    Some(report)
                }
                Err(e) if e.is_invalid_argument() => {
                    warn!("Skipping {}: {}", file.id, e);
                    skipped.fetch_add(1, Ordering::Relaxed);
                    None
                }
                Err(e) => {
                    error!("Failed {}: {}", file.path.display(), e);
                    failed.fetch_add(1, Ordering::Relaxed);
                    None
                }
            }
        })
        .collect();

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Analysis complete");
    }

    let stats = AnalysisStats {
        successful: successful.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
        skipped: skipped.load(Ordering::Relaxed),
    };

    (reports, stats)
}

/// Load and analyze a single dataset
fn analyze_single_dataset(
    file: &DatasetFile,
    request: &AnalysisRequest,
    settings: &Settings,
) -> Result<ReportJson> {
    debug!("Analyzing: {}", file.path.display());

    let dataset = catalog::load(&file.path, settings.max_rows)?;
    let report = analyze(&dataset, request)?;

    if report.complete_rows == 0 && !dataset.is_empty() {
        warn!(
            "{}: no row is complete for the selected features; correlations default to 0",
            file.id
        );
    }

    debug!(
        "Analyzed {}: {} of {} rows complete",
        file.id, report.complete_rows, report.source_rows
    );

    Ok(export::report_to_json(&file.id, &report, settings.top_pairs))
}

fn report_path(settings: &Settings, id: &str) -> PathBuf {
    settings
        .output
        .join(format!("{}{}", id, catalog::scanner::REPORT_SUFFIX))
}

/// Write every report and the run index
fn export_reports(reports: &[ReportJson], settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(&settings.output)
        .map_err(|e| StatsError::output_error(&settings.output, e))?;

    let mut entries = Vec::with_capacity(reports.len());
    for report in reports {
        let path = report_path(settings, &report.metadata.dataset);
        export::write_report(report, &path)?;
        entries.push(IndexEntry {
            dataset: report.metadata.dataset.clone(),
            report: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            complete_rows: report.metadata.complete_rows,
        });
    }

    export::write_index(entries, &settings.output.join("index.json"))?;
    println!(
        "✓ Wrote {} reports to {}",
        reports.len(),
        settings.output.display()
    );

    Ok(())
}
