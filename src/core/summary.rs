//! Transcript summaries.
//!
//! The summary is a plain truncation, not a semantic summary.

/// Maximum characters kept from the transcript
pub const SUMMARY_LIMIT: usize = 150;

/// Appended when the transcript was cut
pub const ELLIPSIS: &str = "...";

/// Truncate a transcript to [`SUMMARY_LIMIT`] characters
///
/// Counts Unicode scalar values, not bytes. Cuts mid-word when needed.
pub fn summarize(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_LIMIT) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}
