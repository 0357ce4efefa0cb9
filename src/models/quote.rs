use serde::{Deserialize, Serialize};

/// An evidentiary quote fragment extracted from a transcript by an upstream step
///
/// The `text` field is what gets aligned against the transcript; the upstream
/// extraction may have paraphrased or truncated it relative to the verbatim
/// utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteFragment {
    /// Quote text used for alignment
    pub text: String,
    /// Speaker the extraction attributed the quote to
    #[serde(default)]
    pub speaker: String,
    /// Timestamp string as reported by the extraction
    #[serde(default)]
    pub timestamp: String,
    /// Optional one-line summary of why this quote is evidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}
