//! Per-group feature means

use crate::error::Result;
use crate::types::{Dataset, FeatureSet, GroupKey, KeyKind, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Means for one group, aligned with [`GroupAverages::features`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMeans {
    /// Display label; numbers render in shortest form
    pub key: String,
    /// Whether the group value was a label or a number
    pub kind: KeyKind,
    /// Rows that fell into this group
    pub rows: usize,
    /// Mean per feature; `None` when no row in the group had a finite value
    pub means: Vec<Option<f64>>,
}

/// Group label → feature → mean, in first-appearance order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAverages {
    pub group_by: String,
    pub features: Vec<String>,
    pub groups: Vec<GroupMeans>,
}

impl GroupAverages {
    /// First group whose display label matches
    ///
    /// A label and a number can render the same (`"2019"` and `2019`); use
    /// [`GroupAverages::group_for`] to tell them apart.
    pub fn group(&self, key: &str) -> Option<&GroupMeans> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Group holding rows whose grouping value equals `value` exactly
    pub fn group_for(&self, value: &Value) -> Option<&GroupMeans> {
        let key = value.group_key()?;
        let label = key.display();
        self.groups
            .iter()
            .find(|g| g.kind == key.kind() && g.key == label)
    }

    /// Mean of a feature within a group; `None` if either is unknown or the
    /// group had no data for the feature
    pub fn get(&self, key: &str, feature: &str) -> Option<f64> {
        let index = self.features.iter().position(|f| f == feature)?;
        self.group(key)?.means.get(index).copied().flatten()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups ordered by descending mean of a feature; absent means sort last
    pub fn rank_by(&self, feature: &str) -> Vec<(&str, Option<f64>)> {
        let index = self.features.iter().position(|f| f == feature);
        let mut ranked: Vec<(&str, Option<f64>)> = self
            .groups
            .iter()
            .map(|g| (g.key.as_str(), index.and_then(|i| g.means[i])))
            .collect();
        ranked.sort_by(|a, b| match (a.1, b.1) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        ranked
    }
}

struct Accumulator {
    key: GroupKey,
    rows: usize,
    sums: Vec<f64>,
    counts: Vec<usize>,
}

/// Average each feature within each distinct value of `group_by`
///
/// Rows without a usable group value (missing, non-finite, or empty label)
/// belong to no group. Only finite feature values contribute to a mean, and a
/// feature with no contributing rows in a group is reported as absent.
///
/// Fails with `InvalidArgument` if `group_by` exists in no row of a
/// non-empty dataset.
pub fn compute_group_averages(
    dataset: &Dataset,
    group_by: &str,
    features: &FeatureSet,
) -> Result<GroupAverages> {
    dataset.require_field(group_by)?;

    let k = features.len();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Accumulator> = Vec::new();
    let mut ungrouped = 0usize;

    for row in dataset {
        let Some(key) = row.get(group_by).group_key() else {
            ungrouped += 1;
            continue;
        };

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(Accumulator {
                key,
                rows: 0,
                sums: vec![0.0; k],
                counts: vec![0; k],
            });
            groups.len() - 1
        });

        let acc = &mut groups[slot];
        acc.rows += 1;
        for (i, feature) in features.iter().enumerate() {
            if let Some(v) = row.number(feature) {
                acc.sums[i] += v;
                acc.counts[i] += 1;
            }
        }
    }

    debug!(
        "Grouped {} rows by '{}' into {} groups ({} ungrouped)",
        dataset.len(),
        group_by,
        groups.len(),
        ungrouped
    );

    let groups = groups
        .into_iter()
        .map(|acc| GroupMeans {
            key: acc.key.display(),
            kind: acc.key.kind(),
            rows: acc.rows,
            means: acc
                .sums
                .iter()
                .zip(&acc.counts)
                .map(|(&sum, &count)| (count > 0).then(|| sum / count as f64))
                .collect(),
        })
        .collect();

    Ok(GroupAverages {
        group_by: group_by.to_string(),
        features: features.names().to_vec(),
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Row;

    fn tracks() -> Dataset {
        vec![
            Row::new().with("genre", "pop").with("energy", 0.8).with("tempo", 120.0),
            Row::new().with("genre", "rock").with("energy", 0.6).with("tempo", Value::Missing),
            Row::new().with("genre", "pop").with("energy", 0.4).with("tempo", 100.0),
            Row::new().with("genre", "Pop").with("energy", 0.1).with("tempo", 90.0),
            Row::new().with("genre", Value::Missing).with("energy", 0.9).with("tempo", 80.0),
            Row::new().with("genre", "rock").with("energy", f64::NAN).with("tempo", Value::Missing),
        ]
        .into_iter()
        .collect()
    }

    fn features() -> FeatureSet {
        FeatureSet::new(["energy", "tempo"]).unwrap()
    }

    #[test]
    fn test_means_per_group() {
        let avg = compute_group_averages(&tracks(), "genre", &features()).unwrap();
        assert!((avg.get("pop", "energy").unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(avg.get("pop", "tempo"), Some(110.0));
        assert_eq!(avg.get("Pop", "energy"), Some(0.1));
        assert_eq!(avg.group("rock").unwrap().rows, 2);
        assert_eq!(avg.get("rock", "energy"), Some(0.6));
    }

    #[test]
    fn test_group_without_data_is_absent() {
        let avg = compute_group_averages(&tracks(), "genre", &features()).unwrap();
        let rock = avg.group("rock").unwrap();
        assert_eq!(rock.means[1], None);
        assert_eq!(avg.get("rock", "tempo"), None);
    }

    #[test]
    fn test_first_appearance_order() {
        let avg = compute_group_averages(&tracks(), "genre", &features()).unwrap();
        let keys: Vec<&str> = avg.keys().collect();
        assert_eq!(keys, vec!["pop", "rock", "Pop"]);
    }

    #[test]
    fn test_numeric_group_keys() {
        let ds: Dataset = vec![
            Row::new().with("year", 2019.0).with("energy", 0.5),
            Row::new().with("year", 2020.0).with("energy", 0.7),
            Row::new().with("year", 2019.0).with("energy", 0.3),
        ]
        .into_iter()
        .collect();
        let avg = compute_group_averages(&ds, "year", &FeatureSet::new(["energy"]).unwrap()).unwrap();
        assert_eq!(avg.len(), 2);
        assert!((avg.get("2019", "energy").unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_labels_and_numbers_form_distinct_groups() {
        let ds: Dataset = vec![
            Row::new().with("year", 2019.0).with("x", 1.0),
            Row::new().with("year", "2019").with("x", 3.0),
            Row::new().with("year", 2019.0).with("x", 5.0),
        ]
        .into_iter()
        .collect();
        let avg = compute_group_averages(&ds, "year", &FeatureSet::new(["x"]).unwrap()).unwrap();

        assert_eq!(avg.len(), 2);
        let number = avg.group_for(&Value::from(2019.0)).unwrap();
        assert_eq!(number.kind, KeyKind::Number);
        assert_eq!(number.means, vec![Some(3.0)]);
        let label = avg.group_for(&Value::from("2019")).unwrap();
        assert_eq!(label.kind, KeyKind::Label);
        assert_eq!(label.means, vec![Some(3.0)]);
        assert_eq!(label.rows, 1);
        assert_eq!(number.rows, 2);
    }

    #[test]
    fn test_signed_zero_shares_a_group() {
        let ds: Dataset = vec![
            Row::new().with("delta", 0.0).with("x", 2.0),
            Row::new().with("delta", -0.0).with("x", 4.0),
        ]
        .into_iter()
        .collect();
        let avg = compute_group_averages(&ds, "delta", &FeatureSet::new(["x"]).unwrap()).unwrap();

        assert_eq!(avg.len(), 1);
        assert_eq!(avg.get("0", "x"), Some(3.0));
    }

    #[test]
    fn test_unknown_group_field_rejected() {
        let err = compute_group_averages(&tracks(), "label", &features()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_empty_dataset() {
        let avg = compute_group_averages(&Dataset::default(), "genre", &features()).unwrap();
        assert!(avg.is_empty());
    }

    #[test]
    fn test_rank_by() {
        let avg = compute_group_averages(&tracks(), "genre", &features()).unwrap();
        let ranked = avg.rank_by("tempo");
        assert_eq!(ranked[0], ("pop", Some(110.0)));
        assert_eq!(ranked[1], ("Pop", Some(90.0)));
        assert_eq!(ranked[2], ("rock", None));
    }
}
