use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{TicketDraft, Utterance};
use crate::transcript::parse_transcript;

/// Read and parse a transcript file into utterances
pub fn load_transcript_file(path: &Path) -> Result<Vec<Utterance>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript: {:?}", path))?;
    Ok(parse_transcript(&raw))
}

/// Read the raw transcript text without parsing (used as generator context)
pub fn load_transcript_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read transcript: {:?}", path))
}

/// Load ticket drafts from a JSON file (an array of drafts)
pub fn load_ticket_drafts(path: &Path) -> Result<Vec<TicketDraft>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ticket drafts: {:?}", path))?;
    let drafts: Vec<TicketDraft> =
        serde_json::from_str(&content).context("Failed to parse ticket drafts JSON")?;
    Ok(drafts)
}
