//! Dataset discovery and loading

use crate::error::{ErrorContext, Result, StatsError};
use crate::types::{Dataset, Row};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extension used for reports this tool writes, never treated as input
pub const REPORT_SUFFIX: &str = ".stats.json";

/// Discovered dataset file
#[derive(Debug, Clone)]
pub struct DatasetFile {
    /// Identifier derived from the path below the scan root, with directory
    /// separators replaced by `__`, e.g. `2023__top_tracks`
    pub id: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Accepted top-level JSON layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetDocument {
    Rows(Vec<Row>),
    Wrapped {
        #[serde(alias = "data")]
        rows: Vec<Row>,
    },
}

/// Scan a path (file or directory) for JSON datasets
pub fn scan(input: &Path, recursive: bool) -> Result<Vec<DatasetFile>> {
    if !input.exists() {
        return Err(StatsError::DatasetNotFound(input.to_path_buf()));
    }

    let mut files = Vec::new();

    if input.is_file() {
        // Single file mode
        let root = input.parent().unwrap_or(input);
        if let Some(file) = try_discover_file(input, root) {
            files.push(file);
        } else {
            return Err(StatsError::UnsupportedFormat {
                path: input.to_path_buf(),
                format: input
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }
    } else if input.is_dir() {
        let walker = if recursive {
            WalkDir::new(input)
        } else {
            WalkDir::new(input).max_depth(1)
        };

        for entry in walker.sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file() {
                if let Some(file) = try_discover_file(path, input) {
                    debug!("Discovered: {}", file.path.display());
                    files.push(file);
                }
            }
        }
    }

    ensure_unique_ids(&files)?;

    info!("Discovered {} datasets", files.len());

    if files.is_empty() {
        warn!("No JSON datasets found in {}", input.display());
    }

    Ok(files)
}

/// Reports are named after dataset ids, so two datasets may not share one
fn ensure_unique_ids(files: &[DatasetFile]) -> Result<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for file in files {
        if let Some(first) = seen.insert(&file.id, &file.path) {
            return Err(StatsError::ConfigError(format!(
                "datasets '{}' and '{}' both map to id '{}'; rename one of them",
                first.display(),
                file.path.display(),
                file.id
            )));
        }
    }
    Ok(())
}

/// Dataset id from the path relative to `root`, without extension
fn dataset_id(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
    let parts: Option<Vec<&str>> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect();
    Some(parts?.join("__"))
}

/// Try to create a DatasetFile if the path is a JSON dataset
fn try_discover_file(path: &Path, root: &Path) -> Option<DatasetFile> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(REPORT_SUFFIX) || name == "index.json" {
        return None;
    }
    let ext = path.extension()?.to_str()?;
    if !ext.eq_ignore_ascii_case("json") {
        return None;
    }

    let id = dataset_id(path, root)?;
    let size_bytes = std::fs::metadata(path).ok()?.len();

    Some(DatasetFile {
        id,
        path: path.to_path_buf(),
        size_bytes,
    })
}

/// Load a dataset, keeping at most `max_rows` rows (0 = unlimited)
pub fn load(path: &Path, max_rows: usize) -> Result<Dataset> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StatsError::DatasetNotFound(path.to_path_buf()),
        _ => StatsError::parse_error(path, e.to_string()),
    })?;

    let document: DatasetDocument =
        serde_json::from_reader(BufReader::new(file)).with_dataset_context(path)?;

    let mut rows = match document {
        DatasetDocument::Rows(rows) | DatasetDocument::Wrapped { rows } => rows,
    };

    if max_rows > 0 && rows.len() > max_rows {
        warn!(
            "{} has {} rows; keeping the first {}",
            path.display(),
            rows.len(),
            max_rows
        );
        rows.truncate(max_rows);
    }

    debug!("Loaded {} rows from {}", rows.len(), path.display());

    Ok(Dataset::new(rows))
}

/// Load the dataset named `id` from a data directory (`<dir>/<id>.json`)
pub fn resolve(dir: &Path, id: &str, max_rows: usize) -> Result<Dataset> {
    load(&dir.join(format!("{}.json", id)), max_rows)
}
