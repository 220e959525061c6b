//! Export modules for JSON reports

pub mod json;

pub use json::{report_to_json, write_index, write_report, IndexEntry, ReportJson};
