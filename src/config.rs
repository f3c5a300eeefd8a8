//! Runtime settings.
//!
//! Every setting is read once at startup from the environment. Each variable
//! is also exposed as a long flag, so the command line wins over the
//! environment:
//!
//! - `NOTION_TOKEN`, `NOTION_DATABASE_ID` (required)
//! - `ALIYUN_KEY_ID`, `ALIYUN_KEY_SECRET` (required)
//! - `ALIYUN_REGION`, `ASR_STRATEGY`, `ASR_SAMPLE_RATE`, `ASR_FORMAT`,
//!   `ASR_ENABLE_WORDS`, endpoint overrides (optional)
//!
//! Required values are optional at parse time so `notion-asr config` can show
//! what is missing; [`SettingsArgs::resolve`] enforces them.

use anyhow::{Context, Result};
use clap::Args;

use crate::transcribe::Strategy;

pub const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com";
pub const DEFAULT_REGION: &str = "cn-shanghai";

/// Settings as parsed from flags and environment
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Notion integration token
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true, global = true)]
    pub notion_token: Option<String>,

    /// Notion database holding the transcription records
    #[arg(long, env = "NOTION_DATABASE_ID", global = true)]
    pub notion_database_id: Option<String>,

    /// Notion API base URL
    #[arg(long, env = "NOTION_API_URL", default_value = DEFAULT_NOTION_API_URL, global = true)]
    pub notion_api_url: String,

    /// Alibaba Cloud AccessKey ID
    #[arg(long, env = "ALIYUN_KEY_ID", hide_env_values = true, global = true)]
    pub aliyun_key_id: Option<String>,

    /// Alibaba Cloud AccessKey secret
    #[arg(long, env = "ALIYUN_KEY_SECRET", hide_env_values = true, global = true)]
    pub aliyun_key_secret: Option<String>,

    /// Alibaba Cloud region
    #[arg(long, env = "ALIYUN_REGION", default_value = DEFAULT_REGION, global = true)]
    pub aliyun_region: String,

    /// Override the scan endpoint (defaults to the regional green-cip host)
    #[arg(long, env = "ALIYUN_SCAN_ENDPOINT", global = true)]
    pub aliyun_scan_endpoint: Option<String>,

    /// Override the task endpoint (defaults to the regional filetrans host)
    #[arg(long, env = "ALIYUN_TASK_ENDPOINT", global = true)]
    pub aliyun_task_endpoint: Option<String>,

    /// Transcription strategy
    #[arg(long, env = "ASR_STRATEGY", value_enum, default_value_t = Strategy::Scan, global = true)]
    pub asr_strategy: Strategy,

    /// Sample rate sent with task submissions (must match the audio)
    #[arg(long, env = "ASR_SAMPLE_RATE", default_value_t = 16000, global = true)]
    pub asr_sample_rate: u32,

    /// Audio format sent with task submissions (must match the audio)
    #[arg(long, env = "ASR_FORMAT", default_value = "wav", global = true)]
    pub asr_format: String,

    /// Ask the task API for word-level segmentation
    #[arg(long, env = "ASR_ENABLE_WORDS", global = true)]
    pub asr_enable_words: bool,
}

/// Resolved settings with every required value present
#[derive(Clone)]
pub struct Settings {
    pub notion: NotionSettings,
    pub aliyun: AliyunSettings,
    pub asr: AsrSettings,
}

#[derive(Clone)]
pub struct NotionSettings {
    pub token: String,
    pub database_id: String,
    pub api_url: String,
}

#[derive(Clone)]
pub struct AliyunSettings {
    pub key_id: String,
    pub key_secret: String,
    pub region: String,
    pub scan_endpoint: String,
    pub task_endpoint: String,
}

#[derive(Debug, Clone)]
pub struct AsrSettings {
    pub strategy: Strategy,
    pub sample_rate: u32,
    pub format: String,
    pub enable_words: bool,
}

impl SettingsArgs {
    /// Check required values and fill in derived defaults
    pub fn resolve(&self) -> Result<Settings> {
        let notion = NotionSettings {
            token: required(&self.notion_token, "NOTION_TOKEN")?,
            database_id: required(&self.notion_database_id, "NOTION_DATABASE_ID")?,
            api_url: self.notion_api_url.trim_end_matches('/').to_string(),
        };

        let region = self.aliyun_region.trim().to_string();
        if region.is_empty() {
            anyhow::bail!("ALIYUN_REGION cannot be empty");
        }

        let aliyun = AliyunSettings {
            key_id: required(&self.aliyun_key_id, "ALIYUN_KEY_ID")?,
            key_secret: required(&self.aliyun_key_secret, "ALIYUN_KEY_SECRET")?,
            scan_endpoint: endpoint(&self.aliyun_scan_endpoint, "green-cip", &region),
            task_endpoint: endpoint(&self.aliyun_task_endpoint, "filetrans", &region),
            region,
        };

        let asr = AsrSettings {
            strategy: self.asr_strategy,
            sample_rate: self.asr_sample_rate,
            format: self.asr_format.clone(),
            enable_words: self.asr_enable_words,
        };

        Ok(Settings {
            notion,
            aliyun,
            asr,
        })
    }
}

fn required(value: &Option<String>, var: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .with_context(|| format!("{} environment variable required", var))
}

fn endpoint(explicit: &Option<String>, product: &str, region: &str) -> String {
    match explicit.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => format!("https://{}.{}.aliyuncs.com", product, region),
    }
}

/// Mask a secret for display
pub fn redact(secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => format!("set ({} chars)", s.chars().count()),
        _ => "(unset)".to_string(),
    }
}
