//! Unified error types for streamstats
//!
//! Error strategy:
//! - Argument errors (empty feature set, unknown field, incomplete row): raised
//!   by the engine before any computation, never partially computed
//! - Per-dataset errors (not found, parse): recoverable, skip and continue
//! - System errors (output, configuration): fatal, abort batch
//!
//! Degenerate data (zero variance, empty datasets, empty groups) is not an
//! error. The engine reports it through defined fallback values instead.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for streamstats operations
#[derive(Debug, Error)]
pub enum StatsError {
    // =========================================================================
    // Argument errors - raised synchronously by the engine
    // =========================================================================
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // =========================================================================
    // Recoverable errors - skip dataset, continue batch
    // =========================================================================
    #[error("Dataset not found: '{0}'\n  Tip: Check the path exists and is accessible")]
    DatasetNotFound(PathBuf),

    #[error("Unsupported dataset format for '{path}': {format}\n  Supported formats: JSON")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("Failed to parse dataset '{path}': {reason}\n  Tip: Expected a JSON array of objects, or an object with a \"rows\" array")]
    ParseError { path: PathBuf, reason: String },

    // =========================================================================
    // Fatal errors - abort entire batch
    // =========================================================================
    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for streamstats operations
pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    /// Returns true if this error only affects a single dataset of a batch
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StatsError::InvalidArgument { .. }
                | StatsError::DatasetNotFound(_)
                | StatsError::UnsupportedFormat { .. }
                | StatsError::ParseError { .. }
        )
    }

    /// Returns true if the engine rejected its arguments
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StatsError::InvalidArgument { .. })
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        StatsError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// A feature set must name at least one field
    pub fn empty_feature_set() -> Self {
        Self::invalid_argument("feature set is empty; at least one feature is required")
    }

    /// A field was requested that no row of the dataset carries
    pub fn unknown_field(field: &str) -> Self {
        Self::invalid_argument(format!("field '{}' does not exist in any row", field))
    }

    /// A row handed to the correlation engine lacks a finite value for a feature
    pub fn incomplete_row(row: usize, field: &str) -> Self {
        Self::invalid_argument(format!(
            "row {} has no finite numeric value for feature '{}'; filter the dataset to complete rows first",
            row, field
        ))
    }

    /// Create a parse error for a dataset file
    pub fn parse_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StatsError::ParseError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!(
                    "Permission denied. Check that you have write access to {}",
                    path.display()
                )
            }
            std::io::ErrorKind::NotFound => {
                format!(
                    "Directory does not exist: {}",
                    path.parent()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                )
            }
            _ => err.to_string(),
        };
        StatsError::OutputError { path, reason }
    }
}

/// Extension trait for adding dataset context to errors
pub trait ErrorContext<T> {
    /// Attach the dataset path to a parse failure
    fn with_dataset_context(self, path: &std::path::Path) -> Result<T>;
}

impl<T, E: std::fmt::Display> ErrorContext<T> for std::result::Result<T, E> {
    fn with_dataset_context(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| StatsError::parse_error(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_errors_are_invalid_argument() {
        assert!(StatsError::empty_feature_set().is_invalid_argument());
        assert!(StatsError::unknown_field("genre").is_invalid_argument());
        assert!(StatsError::incomplete_row(3, "energy").is_invalid_argument());
        assert!(!StatsError::ConfigError("x".into()).is_invalid_argument());
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(StatsError::DatasetNotFound(PathBuf::from("a.json")).is_recoverable());
        assert!(StatsError::parse_error("a.json", "bad").is_recoverable());
        assert!(!StatsError::ConfigError("threads".into()).is_recoverable());
        let out = StatsError::output_error(
            "/out/x.json",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(!out.is_recoverable());
    }

    #[test]
    fn test_messages_name_the_field() {
        let msg = StatsError::unknown_field("tempo").to_string();
        assert!(msg.contains("'tempo'"));
        let msg = StatsError::incomplete_row(7, "energy").to_string();
        assert!(msg.contains("row 7"));
    }
}
