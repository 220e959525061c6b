//! streamstats - Tabular statistics for music-streaming datasets
//!
//! A library and command-line utility that loads pre-generated JSON datasets
//! (track audio features, chart positions, stream counts) and computes the
//! statistics chart pages render: completeness-filtered row subsets,
//! per-group means and a Pearson correlation matrix across features.
//!
//! # Architecture
//!
//! - `types`: typed cell values, rows, datasets and feature sets
//! - `engine`: pure, synchronous statistics (filter, correlation, grouping)
//! - `catalog`: dataset discovery and JSON loading
//! - `config`: CLI argument parsing and runtime settings
//! - `pipeline`: parallel batch processing across datasets
//! - `export`: JSON report output
//!
//! # Example
//!
//! ```
//! use streamstats::engine::{compute_correlation_matrix, filter_numeric};
//! use streamstats::types::{Dataset, FeatureSet, Row};
//!
//! let dataset: Dataset = vec![
//!     Row::new().with("energy", 0.2).with("loudness", -12.0),
//!     Row::new().with("energy", 0.5).with("loudness", -8.0),
//!     Row::new().with("energy", 0.9).with("loudness", -4.0),
//! ]
//! .into_iter()
//! .collect();
//!
//! let features = FeatureSet::new(["energy", "loudness"]).unwrap();
//! let complete = filter_numeric(&dataset, &features).unwrap();
//! let matrix = compute_correlation_matrix(&complete, &features).unwrap();
//! assert_eq!(matrix[0][0], 1.0);
//! assert!(matrix[0][1] > 0.9);
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod types;

// Re-export key types at crate root
pub use engine::{CorrelationMatrix, GroupAverages};
pub use error::{Result, StatsError};
pub use types::{Dataset, FeatureSet, GroupKey, RequiredField, Row, Value};
