use serde::{Deserialize, Serialize};

use super::QuoteFragment;

/// Ticket priority as assigned by the upstream extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Med,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Med => "med",
            Priority::Low => "low",
        }
    }
}

/// A work item drafted by the upstream extraction step
///
/// Drafts are read-only inputs to the export pipeline; generated detail is
/// attached through the detail cache, never written back onto the draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDraft {
    /// Stable id, unique within a session
    pub id: String,
    pub title: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered acceptance criteria, when the extraction produced any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<Vec<String>>,
    /// Supporting quotes from the source transcript
    #[serde(default)]
    pub source_quotes: Vec<QuoteFragment>,
}

/// Generated detail content for a ticket, keyed by the draft's id
///
/// A superset of the draft's content fields, produced on demand by the
/// detail generator and considered more authoritative than the draft when
/// both are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetail {
    pub title: String,
    pub priority: Priority,
    /// Workflow status suggested by the generator (e.g. "todo")
    #[serde(default)]
    pub status: String,
    /// One-paragraph statement of the underlying problem
    #[serde(default)]
    pub problem_statement: String,
    pub description: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// Quotes the generator kept as supporting evidence
    #[serde(default)]
    pub quotes: Vec<QuoteFragment>,
}
