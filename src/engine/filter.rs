//! Row completeness filtering

use crate::error::Result;
use crate::types::{Dataset, FeatureSet, RequiredField};
use tracing::debug;

/// Keep the rows that satisfy every requirement, in their original order
///
/// Numeric requirements need a finite number; presence requirements need a
/// non-null value (labels must be non-empty). An empty requirement list
/// returns the input unchanged and a dataset with no matching rows yields an
/// empty dataset. Filtering is idempotent.
///
/// Fails with `InvalidArgument` if a required field exists in no row of a
/// non-empty dataset.
pub fn filter_complete(dataset: &Dataset, required: &[RequiredField]) -> Result<Dataset> {
    for field in required {
        dataset.require_field(&field.name)?;
    }

    if required.is_empty() {
        return Ok(dataset.clone());
    }

    let kept: Dataset = dataset
        .iter()
        .filter(|row| required.iter().all(|field| field.is_satisfied_by(row)))
        .cloned()
        .collect();

    debug!(
        "Completeness filter kept {} of {} rows ({} requirements)",
        kept.len(),
        dataset.len(),
        required.len()
    );

    Ok(kept)
}

/// Keep rows with a finite value for every feature (listwise-complete)
pub fn filter_numeric(dataset: &Dataset, features: &FeatureSet) -> Result<Dataset> {
    filter_complete(dataset, &features.as_requirements())
}
