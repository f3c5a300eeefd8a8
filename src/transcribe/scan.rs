//! Synchronous scan transcription.
//!
//! Sends the whole file in one `FileAsyncScan` call with asynchronous mode
//! disabled and joins the returned segments.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::Transcriber;
use crate::adapters::{AcsClient, AliyunError, RpcRequest};

pub const SCAN_ACTION: &str = "FileAsyncScan";
pub const SCAN_VERSION: &str = "2022-03-02";
pub const SCAN_SERVICE: &str = "paraformer_realtime";

/// Scan response: one entry per recognized segment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScanResponse {
    #[serde(default)]
    result: Vec<ScanSegment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScanSegment {
    #[serde(default)]
    text: String,
}

/// Transcriber backed by the synchronous scan endpoint
pub struct ScanTranscriber {
    client: AcsClient,
    endpoint: String,
}

impl ScanTranscriber {
    pub fn new(client: AcsClient, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    fn request(&self, audio: &[u8]) -> RpcRequest {
        RpcRequest::new(&self.endpoint, SCAN_ACTION, SCAN_VERSION)
            .param("Service", SCAN_SERVICE)
            .param("Async", false)
            .body(audio.to_vec())
    }
}

#[async_trait]
impl Transcriber for ScanTranscriber {
    fn name(&self) -> &str {
        "scan"
    }

    async fn transcribe(&self, audio: &[u8]) -> Result<Option<String>> {
        debug!(bytes = audio.len(), "Submitting audio to scan endpoint");

        let value = match self.client.call(&self.request(audio)).await {
            Ok(value) => value,
            Err(e @ AliyunError::Server { .. }) => {
                warn!(error = %e, "Recognition service rejected the audio");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let response: ScanResponse = serde_json::from_value(value)
            .map_err(|e| AliyunError::Decode(e.to_string()))?;

        Ok(Some(join_segments(response.result)))
    }
}

/// Join segment texts with newlines, in response order
fn join_segments(segments: Vec<ScanSegment>) -> String {
    segments
        .into_iter()
        .map(|s| s.text)
        .collect::<Vec<_>>()
        .join("\n")
}
