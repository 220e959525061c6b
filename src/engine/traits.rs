//! Estimator trait abstraction
//!
//! The correlation matrix is assembled pair by pair; the coefficient for each
//! pair comes from a swappable estimator so the numeric method can change
//! without touching matrix assembly.

/// Pairwise correlation backend
pub trait CorrelationEstimator: Send + Sync {
    /// Correlation of two equal-length columns
    ///
    /// Must return a value in [-1.0, 1.0], and exactly 0.0 when either column
    /// has zero variance (including empty and single-element columns).
    fn coefficient(&self, x: &[f64], y: &[f64]) -> f64;

    /// Get the name of this estimator (for logging and reports)
    fn name(&self) -> &'static str;
}
