//! One-shot analysis of a dataset
//!
//! Composes the engine operations the way the chart pages consume them:
//! listwise filter, then summaries, correlation and optional group means over
//! the surviving rows.

use crate::engine::correlation::{compute_correlation_matrix_with, CorrelationMatrix, CorrelationMethod};
use crate::engine::filter::filter_complete;
use crate::engine::grouping::{compute_group_averages, GroupAverages};
use crate::engine::summary::{summarize, FeatureSummary};
use crate::error::Result;
use crate::types::{Dataset, FeatureSet, RequiredField};
use serde::Serialize;
use tracing::debug;

/// Explicit analysis configuration passed on every call
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub features: FeatureSet,
    /// Field to partition rows by for group means
    pub group_by: Option<String>,
    /// Extra fields that must be present (non-null, non-empty) for a row to count
    pub require: Vec<String>,
    pub method: CorrelationMethod,
}

impl AnalysisRequest {
    pub fn new(features: FeatureSet) -> Self {
        Self {
            features,
            group_by: None,
            require: Vec::new(),
            method: CorrelationMethod::default(),
        }
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }

    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.require.push(field.into());
        self
    }

    pub fn method(mut self, method: CorrelationMethod) -> Self {
        self.method = method;
        self
    }

    /// Completeness requirements: features numeric, group field and extras present
    pub fn requirements(&self) -> Vec<RequiredField> {
        let mut required = self.features.as_requirements();
        required.extend(self.group_by.iter().map(RequiredField::present));
        required.extend(self.require.iter().map(RequiredField::present));
        required
    }
}

/// Everything computed for one dataset
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub source_rows: usize,
    pub complete_rows: usize,
    pub method: CorrelationMethod,
    pub summaries: Vec<FeatureSummary>,
    pub correlation: CorrelationMatrix,
    pub groups: Option<GroupAverages>,
}

/// Run the full analysis for a request
///
/// Every field the request names is validated against the dataset schema by
/// the listwise filter, before anything is computed.
pub fn analyze(dataset: &Dataset, request: &AnalysisRequest) -> Result<AnalysisReport> {
    let required = request.requirements();

    let complete = filter_complete(dataset, &required)?;
    debug!(
        "Analyzing {} complete rows of {}",
        complete.len(),
        dataset.len()
    );

    let summaries = summarize(&complete, &request.features);
    let correlation =
        compute_correlation_matrix_with(&complete, &request.features, request.method.estimator())?;
    let groups = request
        .group_by
        .as_deref()
        .map(|field| compute_group_averages(&complete, field, &request.features))
        .transpose()?;

    Ok(AnalysisReport {
        source_rows: dataset.len(),
        complete_rows: complete.len(),
        method: request.method,
        summaries,
        correlation,
        groups,
    })
}
