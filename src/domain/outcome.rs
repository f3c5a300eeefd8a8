//! Per-record outcomes and the run summary built from them.

use std::fmt;

/// Result of pushing one record through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Transcript and summary written, status set to Completed
    Completed {
        record_id: String,
        transcript_chars: usize,
    },

    /// Record left untouched on purpose
    Skipped {
        record_id: String,
        reason: SkipReason,
    },

    /// Record left Pending after a failure
    Failed {
        record_id: String,
        reason: FailureReason,
    },
}

impl RecordOutcome {
    pub fn record_id(&self) -> &str {
        match self {
            Self::Completed { record_id, .. }
            | Self::Skipped { record_id, .. }
            | Self::Failed { record_id, .. } => record_id,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Why a record was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No file in the audio property
    NoAudio,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAudio => write!(f, "no audio attachment"),
        }
    }
}

/// Why a record failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The transcriber returned nothing usable (vendor error, timeout, empty text)
    NoTranscript,

    /// A file is attached but has no download URL; carries the file name
    UnusableAttachment(String),

    /// A stage returned an error
    Error(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTranscript => write!(f, "no transcript"),
            Self::UnusableAttachment(name) => {
                write!(f, "attachment '{}' has no download URL", name)
            }
            Self::Error(message) => write!(f, "{}", message),
        }
    }
}

/// Counts of outcomes across one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Count one outcome
    pub fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Completed { .. } => self.completed += 1,
            RecordOutcome::Skipped { .. } => self.skipped += 1,
            RecordOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.failed
    }
}

impl<'a> FromIterator<&'a RecordOutcome> for RunSummary {
    fn from_iter<I: IntoIterator<Item = &'a RecordOutcome>>(iter: I) -> Self {
        let mut summary = Self::default();
        for outcome in iter {
            summary.record(outcome);
        }
        summary
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} completed, {} skipped, {} failed ({} total)",
            self.completed,
            self.skipped,
            self.failed,
            self.total()
        )
    }
}
