//! Adapter interfaces for external systems.
//!
//! Adapters wrap the remote services the pipeline talks to: the Notion
//! database (records and attachments) and the Alibaba Cloud RPC API
//! (speech recognition). The traits here are the seams the pipeline depends
//! on, so tests can substitute fakes.

pub mod aliyun;
pub mod notion;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{AttachedFile, Completion, Record};

// Re-export the concrete clients
pub use aliyun::{AcsClient, AliyunError, RpcRequest};
pub use notion::NotionClient;

/// Source and sink of transcription records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records whose status is Pending, in the order the store returns them
    async fn pending_records(&self) -> Result<Vec<Record>>;

    /// Write the transcript and summary and mark the record Completed
    async fn complete_record(&self, record_id: &str, completion: &Completion) -> Result<()>;
}

/// Downloads attached audio
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch_audio(&self, file: &AttachedFile) -> Result<Vec<u8>>;
}
