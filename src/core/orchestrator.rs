//! Run driver.
//!
//! Lists pending records once, pushes them through the pipeline one at a
//! time in the order the store returned them, and tallies the outcomes.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::adapters::{AudioFetcher, NotionClient, RecordStore};
use crate::config::Settings;
use crate::domain::{Record, RecordOutcome, RunSummary};
use crate::transcribe::{build_transcriber, Transcriber};

use super::pipeline::Pipeline;

/// Main run orchestrator
pub struct Orchestrator {
    store: Arc<dyn RecordStore>,
    fetcher: Arc<dyn AudioFetcher>,
    transcriber: Box<dyn Transcriber>,
}

/// Outcomes of one run, in processing order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<RecordOutcome>,
    pub summary: RunSummary,
}

impl Orchestrator {
    /// Create an orchestrator from explicit collaborators
    pub fn new(
        store: Arc<dyn RecordStore>,
        fetcher: Arc<dyn AudioFetcher>,
        transcriber: Box<dyn Transcriber>,
    ) -> Self {
        Self {
            store,
            fetcher,
            transcriber,
        }
    }

    /// Wire the Notion client and the configured transcriber
    pub fn from_settings(settings: &Settings) -> Self {
        let notion = Arc::new(NotionClient::from_settings(&settings.notion));
        Self::new(notion.clone(), notion, build_transcriber(settings))
    }

    /// Name of the configured transcription strategy
    pub fn strategy(&self) -> &str {
        self.transcriber.name()
    }

    /// List records awaiting transcription
    pub async fn pending(&self) -> Result<Vec<Record>> {
        self.store
            .pending_records()
            .await
            .context("Failed to list pending records")
    }

    /// Process every pending record
    ///
    /// Only a listing failure is returned as an error; per-record failures
    /// end up in the report.
    #[instrument(skip(self), fields(strategy = %self.transcriber.name()))]
    pub async fn run(&self) -> Result<RunReport> {
        let records = self.pending().await?;

        if records.is_empty() {
            info!("No pending records");
            println!("✓ No pending records to process");
            return Ok(RunReport::default());
        }

        info!(count = records.len(), "Processing pending records");
        println!("🎙️  Processing {} pending record(s)", records.len());

        let pipeline = Pipeline::new(
            self.store.as_ref(),
            self.fetcher.as_ref(),
            self.transcriber.as_ref(),
        );

        let mut outcomes = Vec::with_capacity(records.len());
        for record in &records {
            let outcome = pipeline.process_record(record).await;
            print_outcome(&outcome);
            outcomes.push(outcome);
        }

        let report = RunReport {
            summary: outcomes.iter().collect(),
            outcomes,
        };

        info!(
            completed = report.summary.completed,
            skipped = report.summary.skipped,
            failed = report.summary.failed,
            "Run finished"
        );

        Ok(report)
    }
}

fn print_outcome(outcome: &RecordOutcome) {
    let (icon, detail) = match outcome {
        RecordOutcome::Completed {
            transcript_chars, ..
        } => ("✅", format!("completed ({} chars)", transcript_chars)),
        RecordOutcome::Skipped { reason, .. } => ("⏭️ ", format!("skipped ({})", reason)),
        RecordOutcome::Failed { reason, .. } => ("❌", format!("failed ({})", reason)),
    };
    println!("   {} {}: {}", icon, outcome.record_id(), detail);
}
