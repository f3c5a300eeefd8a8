//! Core pipeline logic.
//!
//! This module contains:
//! - Summary: transcript truncation
//! - Pipeline: fetch, transcribe and write back one record
//! - Orchestrator: list pending records and run each through the pipeline

pub mod orchestrator;
pub mod pipeline;
pub mod summary;

// Re-export commonly used types
pub use orchestrator::{Orchestrator, RunReport};
pub use pipeline::Pipeline;
pub use summary::{summarize, SUMMARY_LIMIT};
