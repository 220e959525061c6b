//! JSON report export for chart renderers

use crate::engine::{AnalysisReport, CorrelationMatrix, CorrelationPair, FeatureSummary, GroupMeans};
use crate::error::{Result, StatsError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// JSON output schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level report for one dataset
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportJson {
    /// Schema version for forward compatibility
    pub version: String,
    pub metadata: ReportMetadata,
    /// Axis labels for `correlation` and `groups[].means`
    pub features: Vec<String>,
    /// Row-major correlation matrix
    pub correlation: Vec<Vec<f64>>,
    pub strongest_pairs: Vec<CorrelationPair>,
    pub summaries: Vec<FeatureSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupMeans>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// streamstats version that generated this file
    pub generator_version: String,
    pub exported_at: String,
    /// Dataset identifier
    pub dataset: String,
    pub source_rows: usize,
    pub complete_rows: usize,
    /// Correlation estimator name
    pub method: String,
}

/// Index of every report written in a run
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexJson {
    pub version: String,
    pub exported_at: String,
    pub datasets: Vec<IndexEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexEntry {
    pub dataset: String,
    pub report: String,
    pub complete_rows: usize,
}

/// Build the serializable form of an analysis report
pub fn report_to_json(dataset: &str, report: &AnalysisReport, top_pairs: usize) -> ReportJson {
    let CorrelationMatrix { features, values } = &report.correlation;

    ReportJson {
        version: SCHEMA_VERSION.to_string(),
        metadata: ReportMetadata {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            dataset: dataset.to_string(),
            source_rows: report.source_rows,
            complete_rows: report.complete_rows,
            method: report.method.to_string(),
        },
        features: features.clone(),
        correlation: values.clone(),
        strongest_pairs: report.correlation.strongest_pairs(top_pairs),
        summaries: report.summaries.clone(),
        group_by: report.groups.as_ref().map(|g| g.group_by.clone()),
        groups: report
            .groups
            .as_ref()
            .map(|g| g.groups.clone())
            .unwrap_or_default(),
    }
}

/// Write a report to a JSON file
///
/// Uses atomic write pattern: writes to a temp file first, then renames.
pub fn write_report(report: &ReportJson, output_path: &Path) -> Result<()> {
    write_atomic(report, output_path)?;
    info!(
        "Wrote report for '{}' to {}",
        report.metadata.dataset,
        output_path.display()
    );
    Ok(())
}

/// Write the run index listing each report
pub fn write_index(entries: Vec<IndexEntry>, output_path: &Path) -> Result<()> {
    let index = IndexJson {
        version: SCHEMA_VERSION.to_string(),
        exported_at: chrono::Utc::now().to_rfc3339(),
        datasets: entries,
    };
    write_atomic(&index, output_path)
}

fn write_atomic<T: Serialize>(value: &T, output_path: &Path) -> Result<()> {
    // Same directory keeps the rename on one filesystem
    let temp_path = output_path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| StatsError::output_error(output_path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        StatsError::OutputError {
            path: output_path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    // Drop ignores write errors, so flush explicitly
    writer.flush().map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        StatsError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to flush file: {}", e),
        }
    })?;
    drop(writer);

    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        StatsError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{analyze, AnalysisRequest};
    use crate::types::{Dataset, FeatureSet, Row};
    use tempfile::TempDir;

    fn report() -> AnalysisReport {
        let ds: Dataset = vec![
            Row::new().with("genre", "a").with("x", 1.0).with("y", 2.0),
            Row::new().with("genre", "b").with("x", 2.0).with("y", 1.0),
            Row::new().with("genre", "a").with("x", 3.0).with("y", 0.0),
        ]
        .into_iter()
        .collect();
        let request = AnalysisRequest::new(FeatureSet::new(["x", "y"]).unwrap()).group_by("genre");
        analyze(&ds, &request).unwrap()
    }

    #[test]
    fn test_written_report_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("charts.stats.json");
        let json = report_to_json("charts", &report(), 5);
        write_report(&json, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: ReportJson = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.metadata.dataset, "charts");
        assert_eq!(parsed.metadata.method, "single-pass");
        assert_eq!(parsed.features, vec!["x", "y"]);
        assert_eq!(parsed.correlation.len(), 2);
        assert_eq!(parsed.group_by.as_deref(), Some("genre"));
        assert_eq!(parsed.groups.len(), 2);
        assert!(!dir.path().join("charts.stats.json.tmp").exists());
    }

    #[test]
    fn test_large_report_is_written_whole() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.stats.json");

        // Several times the BufWriter capacity
        let names: Vec<String> = (0..60).map(|i| format!("feature_{:02}", i)).collect();
        let ds: Dataset = (0..40)
            .map(|r| {
                names.iter().enumerate().fold(Row::new(), |row, (i, name)| {
                    row.with(name.as_str(), ((r * (i + 1)) % 17) as f64)
                })
            })
            .collect();
        let request = AnalysisRequest::new(FeatureSet::new(names.clone()).unwrap());
        let json = report_to_json("wide", &analyze(&ds, &request).unwrap(), 10);
        write_report(&json, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.len() > 8 * 1024);
        let parsed: ReportJson = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.correlation.len(), 60);
        assert!(parsed.correlation.iter().all(|row| row.len() == 60));
        assert!(!dir.path().join("wide.stats.json.tmp").exists());
    }

    #[test]
    fn test_absent_means_serialize_as_null() {
        let ds: Dataset = vec![
            Row::new().with("genre", "a").with("x", 1.0),
            Row::new().with("genre", "b").with("x", 2.0).with("y", 3.0),
        ]
        .into_iter()
        .collect();
        let avg = crate::engine::compute_group_averages(
            &ds,
            "genre",
            &FeatureSet::new(["x", "y"]).unwrap(),
        )
        .unwrap();
        let value = serde_json::to_value(&avg.groups[0]).unwrap();
        assert_eq!(value["means"][1], serde_json::Value::Null);
    }
}
