//! Tabular statistics engine
//!
//! Pure, synchronous computations over an immutable [`Dataset`]: completeness
//! filtering, Pearson correlation matrices, per-group means and per-feature
//! summaries. Every call is self-contained; nothing is cached between calls.
//!
//! [`Dataset`]: crate::types::Dataset

pub mod analysis;
pub mod correlation;
pub mod filter;
pub mod grouping;
pub mod summary;
pub mod traits;

pub use traits::CorrelationEstimator;

pub use analysis::{analyze, AnalysisReport, AnalysisRequest};
pub use correlation::{
    compute_correlation_matrix, compute_correlation_matrix_with, CorrelationMatrix,
    CorrelationMethod, CorrelationPair, MeanCenteredPearson, SinglePassPearson,
};
pub use filter::{filter_complete, filter_numeric};
pub use grouping::{compute_group_averages, GroupAverages, GroupMeans};
pub use summary::{summarize, FeatureSummary};
