//! Runtime configuration settings

use crate::engine::{AnalysisRequest, CorrelationMethod};
use crate::error::Result;
use crate::types::FeatureSet;
use std::path::PathBuf;

/// Audio features correlated when none are given on the command line
pub const DEFAULT_FEATURES: &[&str] = &[
    "danceability",
    "energy",
    "valence",
    "acousticness",
    "instrumentalness",
    "liveness",
    "speechiness",
    "tempo",
    "loudness",
];

/// Runtime settings for the analysis pipeline
#[derive(Debug, Clone)]
pub struct Settings {
    /// Input path (file or directory)
    pub input: PathBuf,
    /// Output directory
    pub output: PathBuf,
    /// Features in matrix order
    pub features: Vec<String>,
    /// Grouping field for per-group means
    pub group_by: Option<String>,
    /// Extra presence requirements
    pub require: Vec<String>,
    /// Correlation estimator
    pub method: CorrelationMethod,
    /// Row cap per dataset (0 = unlimited)
    pub max_rows: usize,
    /// Strongest pairs listed per report
    pub top_pairs: usize,
    /// Number of worker threads
    pub threads: usize,
    /// Scan recursively
    pub recursive: bool,
    /// Show progress bars
    pub show_progress: bool,
    /// Dry run mode - list datasets without processing
    pub dry_run: bool,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        let features = if cli.features.is_empty() {
            DEFAULT_FEATURES.iter().map(|f| f.to_string()).collect()
        } else {
            cli.features.clone()
        };

        Self {
            input: cli.input.clone(),
            output: cli.output.clone(),
            features,
            group_by: cli.group_by.clone(),
            require: cli.require.clone(),
            method: cli.method,
            max_rows: cli.max_rows,
            top_pairs: cli.top_pairs,
            threads: cli.threads.unwrap_or_else(default_threads),
            recursive: cli.recursive,
            show_progress: !cli.quiet,
            dry_run: cli.dry_run,
        }
    }

    /// Build the engine request these settings describe
    pub fn analysis_request(&self) -> Result<AnalysisRequest> {
        let mut request =
            AnalysisRequest::new(FeatureSet::new(self.features.iter().cloned())?).method(self.method);
        request.group_by = self.group_by.clone();
        request.require = self.require.clone();
        Ok(request)
    }
}

fn default_threads() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("./data"),
            output: PathBuf::from("./output"),
            features: DEFAULT_FEATURES.iter().map(|f| f.to_string()).collect(),
            group_by: None,
            require: Vec::new(),
            method: CorrelationMethod::default(),
            max_rows: 50_000,
            top_pairs: 10,
            threads: default_threads(),
            recursive: false,
            show_progress: true,
            dry_run: false,
        }
    }
}
