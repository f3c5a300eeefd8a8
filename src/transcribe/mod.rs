//! Speech recognition strategies.
//!
//! Both strategies take raw audio bytes and return a transcript, or `None`
//! when the vendor produced nothing usable. The pipeline only sees the
//! [`Transcriber`] trait.
//!
//! - [`ScanTranscriber`]: one synchronous request
//! - [`TaskTranscriber`]: submit a task, then poll for its result

pub mod scan;
pub mod task;

use anyhow::Result;
use async_trait::async_trait;
use clap::ValueEnum;

use crate::adapters::AcsClient;
use crate::config::Settings;

pub use scan::ScanTranscriber;
pub use task::{poll_task, AliyunTaskApi, PollPolicy, TaskApi, TaskParams, TaskPoll, TaskTranscriber};

/// Bytes in, transcript-or-none out
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Human-readable strategy name
    fn name(&self) -> &str;

    /// Transcribe one audio payload
    async fn transcribe(&self, audio: &[u8]) -> Result<Option<String>>;
}

/// Which transcriber to build at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Synchronous scan request
    Scan,

    /// Asynchronous task with polling
    Task,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::Scan
    }
}

/// Build the configured transcriber
pub fn build_transcriber(settings: &Settings) -> Box<dyn Transcriber> {
    let client = AcsClient::new(
        settings.aliyun.key_id.clone(),
        settings.aliyun.key_secret.clone(),
    );

    match settings.asr.strategy {
        Strategy::Scan => Box::new(ScanTranscriber::new(
            client,
            settings.aliyun.scan_endpoint.clone(),
        )),
        Strategy::Task => {
            let params = TaskParams {
                sample_rate: settings.asr.sample_rate,
                format: settings.asr.format.clone(),
                enable_words: settings.asr.enable_words,
            };
            let api = AliyunTaskApi::new(client, settings.aliyun.task_endpoint.clone(), params);
            Box::new(TaskTranscriber::new(api))
        }
    }
}
