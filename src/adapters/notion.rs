//! Notion API client.
//!
//! Lists pending records, writes completed transcripts back, and downloads
//! attached audio.
//!
//! Endpoints: POST /v1/databases/{id}/query, PATCH /v1/pages/{id}
//! Auth: Bearer token

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{AudioFetcher, RecordStore};
use crate::config::NotionSettings;
use crate::domain::record::{
    PROCESSED_TIME_PROPERTY, STATUS_PROPERTY, SUMMARY_PROPERTY, TRANSCRIPT_PROPERTY,
};
use crate::domain::{AttachedFile, Completion, Record, RecordStatus};

/// API version sent with every request
pub const NOTION_VERSION: &str = "2022-06-28";

/// Maximum characters in one rich-text object
pub const RICH_TEXT_LIMIT: usize = 2000;

/// Notion API client
pub struct NotionClient {
    /// Integration token
    token: String,
    /// Database holding the records
    database_id: String,
    /// API base URL, without trailing slash
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

/// Response from a database query
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Record>,
    #[serde(default)]
    has_more: bool,
}

impl NotionClient {
    /// Create a new client against the public API
    pub fn new(token: String, database_id: String) -> Self {
        Self::with_base_url(token, database_id, crate::config::DEFAULT_NOTION_API_URL)
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(token: String, database_id: String, base_url: &str) -> Self {
        Self {
            token,
            database_id,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from settings
    pub fn from_settings(settings: &NotionSettings) -> Self {
        Self::with_base_url(
            settings.token.clone(),
            settings.database_id.clone(),
            &settings.api_url,
        )
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    /// Query the database for records whose status is Pending
    ///
    /// Only the first page of results is returned; `has_more` is logged and
    /// otherwise ignored.
    pub async fn query_pending(&self) -> Result<Vec<Record>> {
        let url = self.api_url(&format!("databases/{}/query", self.database_id));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&pending_filter())
            .send()
            .await
            .context("Failed to query Notion database")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Notion query failed ({}): {}", status, text);
        }

        let body: QueryResponse = response
            .json()
            .await
            .context("Failed to parse Notion query response")?;

        if body.has_more {
            warn!(
                returned = body.results.len(),
                "Notion reported more pending records; only the first page is processed this run"
            );
        }

        debug!(count = body.results.len(), "Fetched pending records");
        Ok(body.results)
    }

    /// Write transcript, summary, status and processed time to a page
    pub async fn update_page(&self, page_id: &str, completion: &Completion) -> Result<()> {
        let url = self.api_url(&format!("pages/{}", page_id));

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&json!({ "properties": completion_properties(completion) }))
            .send()
            .await
            .with_context(|| format!("Failed to update Notion page {}", page_id))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Notion update failed ({}): {}", status, text);
        }

        Ok(())
    }

    /// Download an attachment with the integration token as bearer
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to download audio")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Audio download failed ({})", status);
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read audio body")?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn pending_records(&self) -> Result<Vec<Record>> {
        self.query_pending().await
    }

    async fn complete_record(&self, record_id: &str, completion: &Completion) -> Result<()> {
        self.update_page(record_id, completion).await
    }
}

#[async_trait]
impl AudioFetcher for NotionClient {
    async fn fetch_audio(&self, file: &AttachedFile) -> Result<Vec<u8>> {
        let url = file
            .download_url()
            .with_context(|| format!("Attachment '{}' has no download URL", file.name))?;
        self.download(url).await
    }
}

/// Query filter selecting Pending records
fn pending_filter() -> Value {
    json!({
        "filter": {
            "property": STATUS_PROPERTY,
            "select": { "equals": RecordStatus::Pending.as_str() }
        }
    })
}

/// Property payload for a completed record
pub fn completion_properties(completion: &Completion) -> Value {
    json!({
        TRANSCRIPT_PROPERTY: { "rich_text": rich_text(&completion.transcript) },
        SUMMARY_PROPERTY: { "rich_text": rich_text(&completion.summary) },
        STATUS_PROPERTY: { "select": { "name": RecordStatus::Completed.as_str() } },
        PROCESSED_TIME_PROPERTY: { "date": { "start": completion.processed_at.to_rfc3339() } },
    })
}

/// Split text into rich-text objects of at most [`RICH_TEXT_LIMIT`] characters
pub fn rich_text(content: &str) -> Vec<Value> {
    let chars: Vec<char> = content.chars().collect();
    if chars.is_empty() {
        return vec![json!({ "text": { "content": "" } })];
    }

    chars
        .chunks(RICH_TEXT_LIMIT)
        .map(|chunk| {
            let text: String = chunk.iter().collect();
            json!({ "text": { "content": text } })
        })
        .collect()
}
