//! CLI argument parsing and configuration

use crate::engine::CorrelationMethod;
use clap::Parser;
use std::path::PathBuf;

/// streamstats - Correlation and grouping statistics for music-streaming datasets
///
/// Reads JSON datasets (arrays of records), keeps the rows complete for the
/// selected features, and writes per-dataset JSON reports with a correlation
/// matrix, feature summaries and optional per-group means.
#[derive(Parser, Debug)]
#[command(name = "streamstats")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Input path (dataset file or directory of datasets)
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output directory for reports
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Numeric features to correlate, in matrix order (defaults to the audio features)
    #[arg(short, long, value_name = "NAMES", value_delimiter = ',')]
    pub features: Vec<String>,

    /// Field whose values partition rows for per-group means (e.g. genre)
    #[arg(short, long, value_name = "FIELD")]
    pub group_by: Option<String>,

    /// Extra fields that must be present for a row to be kept
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub require: Vec<String>,

    /// Correlation estimator
    #[arg(long, value_name = "METHOD", value_enum, default_value_t = CorrelationMethod::SinglePass)]
    pub method: CorrelationMethod,

    /// Maximum rows read from each dataset (0 = unlimited)
    #[arg(long, value_name = "N", default_value_t = 50_000)]
    pub max_rows: usize,

    /// Number of strongest feature pairs listed in each report
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub top_pairs: usize,

    /// Number of worker threads (defaults to CPU count - 1)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Scan subdirectories recursively
    #[arg(short, long, default_value = "false")]
    pub recursive: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bars)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Dry run - list datasets that would be analyzed without processing
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_list() {
        let cli = Cli::try_parse_from([
            "streamstats",
            "-i",
            "data",
            "-o",
            "out",
            "--features",
            "energy,valence,tempo",
            "--group-by",
            "genre",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.features, vec!["energy", "valence", "tempo"]);
        assert_eq!(cli.group_by.as_deref(), Some("genre"));
        assert_eq!(cli.method, CorrelationMethod::SinglePass);
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_parse_method() {
        let cli = Cli::try_parse_from([
            "streamstats", "-i", "data", "-o", "out", "--method", "mean-centered",
        ])
        .unwrap();
        assert_eq!(cli.method, CorrelationMethod::MeanCentered);
    }

    #[test]
    fn test_rejects_unknown_method() {
        let result = Cli::try_parse_from([
            "streamstats", "-i", "data", "-o", "out", "--method", "spearman",
        ]);
        assert!(result.is_err());
    }
}
