//! Pearson correlation matrix
//!
//! Listwise-complete: every row of the input contributes to every pair, so
//! callers filter to complete rows first (see [`filter_numeric`]). Rows are
//! never dropped here; a row lacking a finite value for a feature is rejected
//! as an argument error before any arithmetic happens.
//!
//! Two estimators are available:
//!
//! - [`SinglePassPearson`]: raw sums of products in one pass
//! - [`MeanCenteredPearson`]: two passes around the column means, which keeps
//!   precision for large-magnitude features such as raw stream counts
//!
//! [`filter_numeric`]: crate::engine::filter::filter_numeric

use crate::engine::traits::CorrelationEstimator;
use crate::error::{Result, StatsError};
use crate::types::{Dataset, FeatureSet};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;
use tracing::debug;

// =============================================================================
// Estimators
// =============================================================================

/// Single-pass sum-of-products Pearson estimator
#[derive(Debug, Default, Clone, Copy)]
pub struct SinglePassPearson;

impl CorrelationEstimator for SinglePassPearson {
    fn coefficient(&self, x: &[f64], y: &[f64]) -> f64 {
        if is_constant(x) || is_constant(y) {
            return 0.0;
        }

        let n = x.len().min(y.len()) as f64;
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (&a, &b) in x.iter().zip(y) {
            sum_x += a;
            sum_y += b;
            sum_xy += a * b;
            sum_x2 += a * a;
            sum_y2 += b * b;
        }

        let numerator = n * sum_xy - sum_x * sum_y;
        let spread = (n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y);
        finish(numerator, spread)
    }

    fn name(&self) -> &'static str {
        "single-pass"
    }
}

/// Two-pass mean-centered Pearson estimator
#[derive(Debug, Default, Clone, Copy)]
pub struct MeanCenteredPearson;

impl CorrelationEstimator for MeanCenteredPearson {
    fn coefficient(&self, x: &[f64], y: &[f64]) -> f64 {
        if is_constant(x) || is_constant(y) {
            return 0.0;
        }

        let len = x.len().min(y.len());
        let n = len as f64;
        let mean_x = x[..len].iter().sum::<f64>() / n;
        let mean_y = y[..len].iter().sum::<f64>() / n;

        let (covariance, var_x, var_y) =
            x.iter()
                .zip(y)
                .fold((0.0, 0.0, 0.0), |(cov, vx, vy), (&a, &b)| {
                    let dx = a - mean_x;
                    let dy = b - mean_y;
                    (cov + dx * dy, vx + dx * dx, vy + dy * dy)
                });

        finish(covariance, var_x * var_y)
    }

    fn name(&self) -> &'static str {
        "mean-centered"
    }
}

/// Divide by the square-rooted spread, applying the zero-variance rule
///
/// A non-positive spread (zero variance, or a rounding artefact below zero)
/// yields 0.0. Overflowed arithmetic is the caller's responsibility and also
/// lands on 0.0 rather than NaN.
fn finish(numerator: f64, spread: f64) -> f64 {
    if spread.is_nan() || spread <= 0.0 {
        return 0.0;
    }
    let r = numerator / spread.sqrt();
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// True for columns with fewer than two distinct values
fn is_constant(column: &[f64]) -> bool {
    match column.split_first() {
        Some((first, rest)) => rest.iter().all(|v| v == first),
        None => true,
    }
}

/// Selectable correlation method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CorrelationMethod {
    #[default]
    SinglePass,
    MeanCentered,
}

impl CorrelationMethod {
    pub fn estimator(self) -> &'static dyn CorrelationEstimator {
        match self {
            CorrelationMethod::SinglePass => &SinglePassPearson,
            CorrelationMethod::MeanCentered => &MeanCenteredPearson,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.estimator().name()
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMethod {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        <Self as ValueEnum>::from_str(s, true).map_err(|_| {
            StatsError::ConfigError(format!(
                "unknown correlation method '{}' (expected single-pass or mean-centered)",
                s
            ))
        })
    }
}

// =============================================================================
// Matrix
// =============================================================================

/// Square, symmetric correlation matrix labelled by feature order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Axis labels, one per row/column
    pub features: Vec<String>,
    /// Row-major k×k coefficients
    pub values: Vec<Vec<f64>>,
}

/// One off-diagonal entry of a matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub a: String,
    pub b: String,
    pub coefficient: f64,
}

impl CorrelationMatrix {
    /// Identity-diagonal matrix with zeroed off-diagonals
    fn identity(features: &FeatureSet) -> Self {
        let k = features.len();
        let values = (0..k)
            .map(|i| (0..k).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Self {
            features: features.names().to_vec(),
            values,
        }
    }

    /// Number of features along each axis
    pub fn size(&self) -> usize {
        self.features.len()
    }

    pub fn value(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Coefficient for two features by name (first occurrence of each)
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.features.iter().position(|f| f == a)?;
        let j = self.features.iter().position(|f| f == b)?;
        self.value(i, j)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Off-diagonal pairs ordered by descending absolute coefficient
    ///
    /// Each unordered pair appears once; ties keep matrix order.
    pub fn strongest_pairs(&self, limit: usize) -> Vec<CorrelationPair> {
        let k = self.size();
        let mut pairs: Vec<CorrelationPair> = (0..k)
            .flat_map(|i| ((i + 1)..k).map(move |j| (i, j)))
            .map(|(i, j)| CorrelationPair {
                a: self.features[i].clone(),
                b: self.features[j].clone(),
                coefficient: self.values[i][j],
            })
            .collect();
        pairs.sort_by(|x, y| y.coefficient.abs().total_cmp(&x.coefficient.abs()));
        pairs.truncate(limit);
        pairs
    }
}

impl Index<usize> for CorrelationMatrix {
    type Output = [f64];

    fn index(&self, row: usize) -> &[f64] {
        &self.values[row]
    }
}

/// Compute the correlation matrix with the default single-pass method
pub fn compute_correlation_matrix(
    dataset: &Dataset,
    features: &FeatureSet,
) -> Result<CorrelationMatrix> {
    compute_correlation_matrix_with(dataset, features, CorrelationMethod::default().estimator())
}

/// Compute the correlation matrix with an explicit estimator
///
/// Fails with `InvalidArgument` if a feature exists in no row, or if any row
/// lacks a finite value for a feature. Validation completes before any
/// coefficient is computed.
pub fn compute_correlation_matrix_with(
    dataset: &Dataset,
    features: &FeatureSet,
    estimator: &dyn CorrelationEstimator,
) -> Result<CorrelationMatrix> {
    let columns = extract_columns(dataset, features)?;

    debug!(
        "Correlating {} features over {} rows ({})",
        features.len(),
        dataset.len(),
        estimator.name()
    );

    let mut matrix = CorrelationMatrix::identity(features);
    let k = features.len();
    for i in 0..k {
        for j in (i + 1)..k {
            let r = estimator.coefficient(&columns[i], &columns[j]);
            matrix.values[i][j] = r;
            matrix.values[j][i] = r;
        }
    }

    Ok(matrix)
}

/// Pull one numeric column per feature, rejecting incomplete rows
fn extract_columns(dataset: &Dataset, features: &FeatureSet) -> Result<Vec<Vec<f64>>> {
    for feature in features.iter() {
        dataset.require_field(feature)?;
    }

    features
        .iter()
        .map(|feature| {
            dataset
                .iter()
                .enumerate()
                .map(|(index, row)| {
                    row.number(feature)
                        .ok_or_else(|| StatsError::incomplete_row(index, feature))
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Row;

    const EPSILON: f64 = 1e-9;

    fn dataset(pairs: &[(f64, f64)]) -> Dataset {
        pairs
            .iter()
            .map(|&(a, b)| Row::new().with("A", a).with("B", b))
            .collect()
    }

    fn features(names: &[&str]) -> FeatureSet {
        FeatureSet::new(names.iter().copied()).unwrap()
    }

    fn both_methods() -> [CorrelationMethod; 2] {
        [CorrelationMethod::SinglePass, CorrelationMethod::MeanCentered]
    }

    #[test]
    fn test_exact_linear_relation() {
        let ds = dataset(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]);
        let m = compute_correlation_matrix(&ds, &features(&["A", "B"])).unwrap();
        assert_eq!(m.size(), 2);
        for i in 0..2 {
            for j in 0..2 {
                assert!((m[i][j] - 1.0).abs() < EPSILON, "m[{}][{}] = {}", i, j, m[i][j]);
            }
        }
    }

    #[test]
    fn test_affine_relation_is_perfect() {
        let rows: Vec<(f64, f64)> = (1..=25).map(|a| (a as f64, 2.0 * a as f64 + 3.0)).collect();
        let ds = dataset(&rows);
        for method in both_methods() {
            let m = compute_correlation_matrix_with(&ds, &features(&["A", "B"]), method.estimator())
                .unwrap();
            assert!((m[0][1] - 1.0).abs() < EPSILON, "{}: {}", method, m[0][1]);
        }
    }

    #[test]
    fn test_perfect_negative() {
        let rows: Vec<(f64, f64)> = (0..10).map(|a| (a as f64 * 0.37, -(a as f64 * 0.37))).collect();
        let ds = dataset(&rows);
        for method in both_methods() {
            let m = compute_correlation_matrix_with(&ds, &features(&["A", "B"]), method.estimator())
                .unwrap();
            assert!((m[0][1] + 1.0).abs() < EPSILON, "{}: {}", method, m[0][1]);
            assert!(m[0][1] >= -1.0);
        }
    }

    #[test]
    fn test_constant_feature_is_zero() {
        let ds = dataset(&[(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)]);
        for method in both_methods() {
            let m = compute_correlation_matrix_with(&ds, &features(&["A", "B"]), method.estimator())
                .unwrap();
            assert_eq!(m[0][1], 0.0);
            assert_eq!(m[1][0], 0.0);
            assert_eq!(m[1][1], 1.0);
        }
    }

    #[test]
    fn test_constant_fractional_feature_is_zero() {
        // 0.1 has no exact binary form; sums of squares do not cancel exactly
        let ds = dataset(&[(0.1, 1.0), (0.1, 2.0), (0.1, 7.0), (0.1, 3.0)]);
        let m = compute_correlation_matrix(&ds, &features(&["A", "B"])).unwrap();
        assert_eq!(m[0][1], 0.0);
    }

    #[test]
    fn test_empty_dataset_gives_identity() {
        let ds = Dataset::default();
        let m = compute_correlation_matrix(&ds, &features(&["A", "B", "C"])).unwrap();
        assert_eq!(m.size(), 3);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(m[i][j], expected);
            }
        }
    }

    #[test]
    fn test_single_row_is_zero_variance() {
        let ds = dataset(&[(4.0, 9.0)]);
        let m = compute_correlation_matrix(&ds, &features(&["A", "B"])).unwrap();
        assert_eq!(m[0][1], 0.0);
    }

    #[test]
    fn test_symmetry_diagonal_and_range() {
        let ds: Dataset = (0..40)
            .map(|i| {
                let x = i as f64;
                Row::new()
                    .with("energy", (x * 0.7).sin())
                    .with("valence", (x * 1.3).cos() + x / 40.0)
                    .with("tempo", 90.0 + (x * 17.0) % 60.0)
                    .with("streams", 1.0e9 + x * x * 1.0e6)
            })
            .collect();
        let fs = features(&["energy", "valence", "tempo", "streams"]);
        for method in both_methods() {
            let m = compute_correlation_matrix_with(&ds, &fs, method.estimator()).unwrap();
            for i in 0..4 {
                assert_eq!(m[i][i], 1.0);
                for j in 0..4 {
                    assert_eq!(m[i][j], m[j][i]);
                    assert!((-1.0..=1.0).contains(&m[i][j]));
                }
            }
        }
    }

    #[test]
    fn test_duplicate_feature_correlates_perfectly() {
        let ds = dataset(&[(1.0, 3.0), (2.0, 1.0), (4.0, 2.0)]);
        let m = compute_correlation_matrix(&ds, &features(&["A", "B", "A"])).unwrap();
        assert!((m[0][2] - 1.0).abs() < EPSILON);
        assert_eq!(m[0][2], m[2][0]);
    }

    #[test]
    fn test_incomplete_row_rejected() {
        let mut rows = dataset(&[(1.0, 2.0), (2.0, 3.0)]).into_rows();
        rows.push(Row::new().with("A", 3.0).with("B", f64::NAN));
        let ds = Dataset::new(rows);
        let err = compute_correlation_matrix(&ds, &features(&["A", "B"])).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let ds = dataset(&[(1.0, 2.0)]);
        let err = compute_correlation_matrix(&ds, &features(&["A", "loudness"])).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("loudness"));
    }

    #[test]
    fn test_lookup_and_strongest_pairs() {
        let ds: Dataset = (0..10)
            .map(|i| {
                let x = i as f64;
                Row::new()
                    .with("a", x)
                    .with("b", -x)
                    .with("c", (x * 2.1).sin())
            })
            .collect();
        let m = compute_correlation_matrix(&ds, &features(&["a", "b", "c"])).unwrap();
        assert_eq!(m.get("a", "b"), m.value(0, 1));
        assert_eq!(m.get("a", "zzz"), None);

        let pairs = m.strongest_pairs(10);
        assert_eq!(pairs.len(), 3);
        assert_eq!((pairs[0].a.as_str(), pairs[0].b.as_str()), ("a", "b"));
        assert!(pairs[0].coefficient < -0.99);
        assert_eq!(m.strongest_pairs(1).len(), 1);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("single-pass".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::SinglePass);
        assert_eq!("Mean-Centered".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::MeanCentered);
        assert!("spearman".parse::<CorrelationMethod>().is_err());
        assert_eq!(CorrelationMethod::MeanCentered.to_string(), "mean-centered");
    }
}
