//! Per-record pipeline.
//!
//! One record goes through fetch, transcribe and write-back. Every failure is
//! turned into a [`RecordOutcome`] here, so the caller never sees an error for
//! a single record.

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info, instrument, warn};

use crate::adapters::{AudioFetcher, RecordStore};
use crate::domain::{Completion, FailureReason, Record, RecordOutcome, SkipReason};
use crate::transcribe::Transcriber;

use super::summary::summarize;

/// The collaborators one record needs
pub struct Pipeline<'a> {
    pub store: &'a dyn RecordStore,
    pub fetcher: &'a dyn AudioFetcher,
    pub transcriber: &'a dyn Transcriber,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        fetcher: &'a dyn AudioFetcher,
        transcriber: &'a dyn Transcriber,
    ) -> Self {
        Self {
            store,
            fetcher,
            transcriber,
        }
    }

    /// Process one record and report what happened
    #[instrument(skip(self, record), fields(record_id = %record.id))]
    pub async fn process_record(&self, record: &Record) -> RecordOutcome {
        match self.try_process(record).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Record failed");
                RecordOutcome::Failed {
                    record_id: record.id.clone(),
                    reason: FailureReason::Error(format!("{:#}", e)),
                }
            }
        }
    }

    async fn try_process(&self, record: &Record) -> Result<RecordOutcome> {
        let Some(file) = record.audio() else {
            info!("No audio attached, skipping");
            return Ok(RecordOutcome::Skipped {
                record_id: record.id.clone(),
                reason: SkipReason::NoAudio,
            });
        };

        if file.download_url().is_none() {
            warn!(file = %file.name, "Attachment has no download URL");
            return Ok(RecordOutcome::Failed {
                record_id: record.id.clone(),
                reason: FailureReason::UnusableAttachment(file.name.clone()),
            });
        }

        let audio = self
            .fetcher
            .fetch_audio(file)
            .await
            .with_context(|| format!("Failed to fetch '{}'", file.name))?;
        debug!(bytes = audio.len(), file = %file.name, "Downloaded audio");

        let transcript = self
            .transcriber
            .transcribe(&audio)
            .await
            .with_context(|| format!("Transcription via {} failed", self.transcriber.name()))?;
        drop(audio);

        let Some(transcript) = transcript.filter(|t| !t.is_empty()) else {
            warn!("No transcript returned, leaving record pending");
            return Ok(RecordOutcome::Failed {
                record_id: record.id.clone(),
                reason: FailureReason::NoTranscript,
            });
        };

        let completion = Completion {
            summary: summarize(&transcript),
            transcript,
            processed_at: Local::now(),
        };

        self.store
            .complete_record(&record.id, &completion)
            .await
            .context("Failed to write transcript back")?;

        info!(chars = completion.transcript.chars().count(), "Record completed");
        Ok(RecordOutcome::Completed {
            record_id: record.id.clone(),
            transcript_chars: completion.transcript.chars().count(),
        })
    }
}
