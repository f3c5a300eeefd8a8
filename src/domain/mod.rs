//! Domain types for the transcription pipeline.
//!
//! This module contains the core data structures:
//! - Record: a database page awaiting (or holding) a transcript
//! - Outcome: what happened to one record, and the run summary

pub mod outcome;
pub mod record;

// Re-export commonly used types
pub use outcome::{FailureReason, RecordOutcome, RunSummary, SkipReason};
pub use record::{AttachedFile, Completion, Record, RecordStatus};
