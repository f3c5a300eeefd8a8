//! notion-asr - Transcribe pending Notion audio records
//!
//! Polls a Notion database for records marked `Pending`, downloads the
//! attached audio, sends it to Alibaba Cloud speech recognition, and writes
//! the transcript and a short summary back, marking the record `Completed`.
//!
//! # Architecture
//!
//! A single sequential pipeline per record:
//! - Lister: query the database for Pending records
//! - Fetcher: download the first attached audio file
//! - Transcriber: scan (synchronous) or task (submit and poll)
//! - Updater: write transcript, summary, status and processed time
//!
//! A failure in any stage only affects its record; it stays Pending and is
//! picked up again on the next run.
//!
//! # Modules
//!
//! - `adapters`: External systems (Notion, Alibaba Cloud RPC)
//! - `core`: Pipeline, orchestrator, summary
//! - `domain`: Data structures (Record, RecordOutcome, RunSummary)
//! - `transcribe`: Recognition strategies
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Transcribe everything pending
//! notion-asr run
//!
//! # See what is pending
//! notion-asr pending
//!
//! # Use the submit/poll strategy
//! ASR_STRATEGY=task notion-asr run
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod transcribe;

// Re-export main types at crate root for convenience
pub use core::{summarize, Orchestrator, Pipeline, RunReport};
pub use domain::{AttachedFile, Completion, Record, RecordOutcome, RecordStatus, RunSummary};
pub use transcribe::{Strategy, Transcriber};

// External system clients
pub use adapters::{AcsClient, NotionClient};
