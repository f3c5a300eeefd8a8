//! Database records as read from a Notion query.
//!
//! A record is a page in the transcription database. Only the properties the
//! pipeline reads are modelled; everything else in the page payload is ignored.

use std::fmt;

use chrono::{DateTime, Local};
use serde::Deserialize;

/// Select property driving selection and completion
pub const STATUS_PROPERTY: &str = "Status";

/// Files property holding the audio attachment
pub const AUDIO_PROPERTY: &str = "Audio";

/// Rich-text property receiving the full transcript
pub const TRANSCRIPT_PROPERTY: &str = "Transcript";

/// Rich-text property receiving the truncated summary
pub const SUMMARY_PROPERTY: &str = "Summary";

/// Date property receiving the processing time
pub const PROCESSED_TIME_PROPERTY: &str = "ProcessedTime";

/// A transcription record (one Notion page)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawPage")]
pub struct Record {
    /// Page identifier, opaque to this crate
    pub id: String,

    /// Current value of the status select
    pub status: RecordStatus,

    /// First attached audio file; `None` only when the files list is empty
    /// or absent
    pub audio: Option<AttachedFile>,

    /// Transcript already written to the record
    pub transcript: Option<String>,

    /// Summary already written to the record
    pub summary: Option<String>,

    /// Processed time already written to the record
    pub processed_at: Option<String>,
}

impl Record {
    /// Create a pending record with an optional attachment
    pub fn pending(id: impl Into<String>, audio: Option<AttachedFile>) -> Self {
        Self {
            id: id.into(),
            status: RecordStatus::Pending,
            audio,
            transcript: None,
            summary: None,
            processed_at: None,
        }
    }

    /// The file the audio fetcher should download
    pub fn audio(&self) -> Option<&AttachedFile> {
        self.audio.as_ref()
    }
}

/// Value of the status select property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// Waiting to be transcribed
    Pending,

    /// Transcript written back
    Completed,

    /// Any other option, kept verbatim
    Other(String),

    /// Select left empty
    Unset,
}

impl RecordStatus {
    /// Notion select option name for this status
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Other(name) => name,
            Self::Unset => "",
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "Pending" => Self::Pending,
            "Completed" => Self::Completed,
            "" => Self::Unset,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "(unset)"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// An audio file attached to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    /// Display name of the attachment
    pub name: String,

    /// Download URL (signed for Notion-hosted files), `None` for attachment
    /// kinds that cannot be fetched directly, such as pending uploads
    pub url: Option<String>,
}

impl AttachedFile {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
        }
    }

    /// An attachment present on the record but without a download URL
    pub fn without_url(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }

    pub fn download_url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// Values written back when a record is completed
#[derive(Debug, Clone)]
pub struct Completion {
    pub transcript: String,
    pub summary: String,
    pub processed_at: DateTime<Local>,
}

// ============================================================================
// Raw page payload
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPage {
    id: String,
    #[serde(default)]
    properties: RawProperties,
}

#[derive(Debug, Default, Deserialize)]
struct RawProperties {
    #[serde(rename = "Status")]
    status: Option<SelectProperty>,
    #[serde(rename = "Audio")]
    audio: Option<FilesProperty>,
    #[serde(rename = "Transcript")]
    transcript: Option<RichTextProperty>,
    #[serde(rename = "Summary")]
    summary: Option<RichTextProperty>,
    #[serde(rename = "ProcessedTime")]
    processed_time: Option<DateProperty>,
}

#[derive(Debug, Deserialize)]
struct SelectProperty {
    select: Option<SelectOption>,
}

#[derive(Debug, Deserialize)]
struct SelectOption {
    name: String,
}

#[derive(Debug, Deserialize)]
struct FilesProperty {
    #[serde(default)]
    files: Vec<RawFile>,
}

/// Notion-hosted files carry `file.url`, linked files carry `external.url`
#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(default)]
    name: String,
    file: Option<FileUrl>,
    external: Option<FileUrl>,
}

#[derive(Debug, Deserialize)]
struct FileUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RichTextProperty {
    #[serde(default)]
    rich_text: Vec<RichTextItem>,
}

#[derive(Debug, Deserialize)]
struct RichTextItem {
    #[serde(default)]
    plain_text: String,
}

#[derive(Debug, Deserialize)]
struct DateProperty {
    date: Option<DateValue>,
}

#[derive(Debug, Deserialize)]
struct DateValue {
    start: String,
}

impl RichTextProperty {
    fn into_text(self) -> Option<String> {
        if self.rich_text.is_empty() {
            return None;
        }
        Some(self.rich_text.into_iter().map(|t| t.plain_text).collect())
    }
}

impl From<RawPage> for Record {
    fn from(page: RawPage) -> Self {
        let props = page.properties;

        let status = props
            .status
            .and_then(|s| s.select)
            .map(|opt| RecordStatus::from_name(&opt.name))
            .unwrap_or(RecordStatus::Unset);

        let audio = props
            .audio
            .and_then(|a| a.files.into_iter().next())
            .map(|f| AttachedFile {
                url: f.file.or(f.external).map(|u| u.url),
                name: f.name,
            });

        Self {
            id: page.id,
            status,
            audio,
            transcript: props.transcript.and_then(RichTextProperty::into_text),
            summary: props.summary.and_then(RichTextProperty::into_text),
            processed_at: props.processed_time.and_then(|d| d.date).map(|d| d.start),
        }
    }
}
