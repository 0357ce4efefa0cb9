use serde::{Deserialize, Serialize};

/// One parsed speaker turn from a transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// Position in the parsed sequence (zero-based, contiguous)
    pub index: usize,
    /// Speaker name, empty for anonymous utterances
    pub speaker: String,
    /// Flattened spoken content used for matching (continuations space-joined)
    pub text: String,
    /// Original lines with line breaks preserved (continuations newline-joined)
    pub raw_text: String,
}

impl Utterance {
    /// Whether this utterance has no attributed speaker
    pub fn is_anonymous(&self) -> bool {
        self.speaker.is_empty()
    }
}
