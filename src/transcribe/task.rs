//! Submit-and-poll transcription.
//!
//! The audio is submitted as a recognition task, then the task result is
//! polled a fixed number of times at a fixed interval. Only the first
//! recognized sentence of a successful result is returned; later sentences
//! are dropped.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::Transcriber;
use crate::adapters::{AcsClient, AliyunError, RpcRequest};

pub const SUBMIT_ACTION: &str = "SubmitTask";
pub const QUERY_ACTION: &str = "GetTaskResult";
pub const TASK_VERSION: &str = "2018-08-17";

/// Status text of a finished task
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Fixed polling cadence for task results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Number of result queries, including the first
    pub max_attempts: u32,

    /// Sleep between consecutive queries
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            interval: Duration::from_secs(5),
        }
    }
}

/// Audio parameters sent with a submission
///
/// These must describe the actual encoding of the audio; they are passed
/// through unchecked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskParams {
    pub sample_rate: u32,
    pub format: String,
    pub enable_words: bool,
}

/// One poll of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPoll {
    /// Vendor status text (`SUCCESS`, `RUNNING`, `QUEUEING`, ...)
    pub status: String,

    /// Sentence texts, in order; empty until the task succeeds
    pub sentences: Vec<String>,
}

impl TaskPoll {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Task-based recognition API
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Submit audio and return the task identifier
    async fn submit(&self, audio: &[u8]) -> Result<String>;

    /// Query the current state of a task
    async fn query(&self, task_id: &str) -> Result<TaskPoll>;
}

/// Poll a task until it succeeds or the attempt budget runs out
///
/// Returns the first sentence of the first successful poll. Sleeps only
/// between attempts, so a task that never succeeds costs
/// `max_attempts - 1` intervals.
#[instrument(skip(api, policy), fields(max_attempts = policy.max_attempts))]
pub async fn poll_task(
    api: &dyn TaskApi,
    task_id: &str,
    policy: PollPolicy,
) -> Result<Option<String>> {
    for attempt in 1..=policy.max_attempts {
        let poll = api.query(task_id).await?;

        if poll.is_success() {
            info!(attempt, sentences = poll.sentences.len(), "Task finished");
            if poll.sentences.len() > 1 {
                debug!(
                    dropped = poll.sentences.len() - 1,
                    "Keeping only the first sentence"
                );
            }
            return Ok(poll.sentences.into_iter().next());
        }

        debug!(attempt, status = %poll.status, "Task not finished yet");

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    warn!(
        attempts = policy.max_attempts,
        "Task did not finish within the polling budget"
    );
    Ok(None)
}

/// Transcriber backed by a task API
pub struct TaskTranscriber<A: TaskApi> {
    api: A,
    policy: PollPolicy,
}

impl<A: TaskApi> TaskTranscriber<A> {
    pub fn new(api: A) -> Self {
        Self::with_policy(api, PollPolicy::default())
    }

    pub fn with_policy(api: A, policy: PollPolicy) -> Self {
        Self { api, policy }
    }
}

#[async_trait]
impl<A: TaskApi> Transcriber for TaskTranscriber<A> {
    fn name(&self) -> &str {
        "task"
    }

    async fn transcribe(&self, audio: &[u8]) -> Result<Option<String>> {
        let task_id = self.api.submit(audio).await?;
        info!(%task_id, "Submitted recognition task");

        poll_task(&self.api, &task_id, self.policy).await
    }
}

// ============================================================================
// Aliyun file transcription
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubmitResponse {
    task_id: Option<String>,
    #[serde(default)]
    status_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryResponse {
    #[serde(default)]
    status_text: String,
    result: Option<TaskResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaskResult {
    #[serde(default)]
    sentences: Vec<Sentence>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Sentence {
    #[serde(default)]
    text: String,
}

/// File transcription task API
pub struct AliyunTaskApi {
    client: AcsClient,
    endpoint: String,
    params: TaskParams,
}

impl AliyunTaskApi {
    pub fn new(client: AcsClient, endpoint: String, params: TaskParams) -> Self {
        Self {
            client,
            endpoint,
            params,
        }
    }

    fn submit_request(&self, audio: &[u8]) -> RpcRequest {
        RpcRequest::new(&self.endpoint, SUBMIT_ACTION, TASK_VERSION)
            .param("SampleRate", self.params.sample_rate)
            .param("Format", &self.params.format)
            .param("EnableWords", self.params.enable_words)
            .body(audio.to_vec())
    }

    fn query_request(&self, task_id: &str) -> RpcRequest {
        RpcRequest::new(&self.endpoint, QUERY_ACTION, TASK_VERSION).param("TaskId", task_id)
    }
}

#[async_trait]
impl TaskApi for AliyunTaskApi {
    async fn submit(&self, audio: &[u8]) -> Result<String> {
        let value = self
            .client
            .call(&self.submit_request(audio))
            .await
            .context("Failed to submit recognition task")?;

        let response: SubmitResponse = serde_json::from_value(value)
            .map_err(|e| AliyunError::Decode(e.to_string()))?;

        response
            .task_id
            .filter(|id| !id.is_empty())
            .with_context(|| format!("Task submission returned no TaskId (status {})", response.status_text))
    }

    async fn query(&self, task_id: &str) -> Result<TaskPoll> {
        let value = self
            .client
            .call(&self.query_request(task_id))
            .await
            .with_context(|| format!("Failed to query recognition task {}", task_id))?;

        let response: QueryResponse = serde_json::from_value(value)
            .map_err(|e| AliyunError::Decode(e.to_string()))?;

        Ok(TaskPoll {
            status: response.status_text,
            sentences: response
                .result
                .map(|r| r.sentences.into_iter().map(|s| s.text).collect())
                .unwrap_or_default(),
        })
    }
}
