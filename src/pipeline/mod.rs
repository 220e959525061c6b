//! Batch processing over discovered datasets

pub mod orchestrator;

pub use orchestrator::{run, PipelineResult};
