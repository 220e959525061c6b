//! Per-feature descriptive statistics
//!
//! Renderers use these to normalise radar and bar axes.

use crate::types::{Dataset, FeatureSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub feature: String,
    /// Rows holding a finite value for the feature
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Population standard deviation
    pub std_dev: Option<f64>,
}

/// Summarise each feature over the finite values present
///
/// Statistics are absent for features with no finite values.
pub fn summarize(dataset: &Dataset, features: &FeatureSet) -> Vec<FeatureSummary> {
    features
        .iter()
        .map(|feature| {
            let values: Vec<f64> = dataset.iter().filter_map(|row| row.number(feature)).collect();
            summarize_column(feature, &values)
        })
        .collect()
}

fn summarize_column(feature: &str, values: &[f64]) -> FeatureSummary {
    if values.is_empty() {
        return FeatureSummary {
            feature: feature.to_string(),
            count: 0,
            mean: None,
            min: None,
            max: None,
            std_dev: None,
        };
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    FeatureSummary {
        feature: feature.to_string(),
        count: values.len(),
        mean: Some(mean),
        min: Some(min),
        max: Some(max),
        std_dev: Some(variance.sqrt()),
    }
}
