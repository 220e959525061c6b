//! Dataset catalog: discovery and JSON loading

pub mod scanner;

pub use scanner::{load, resolve, scan, DatasetFile};
