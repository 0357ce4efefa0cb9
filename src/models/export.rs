use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Priority;

/// Provider-neutral create-issue payload built by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuePayload {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub acceptance_criteria: Vec<String>,
    /// Deep link back to the source meeting/transcript, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_link_url: Option<String>,
}

/// Reference to an issue created in the external tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRef {
    /// Provider-internal id
    pub external_id: String,
    /// Human-facing key (e.g. "ENG-412")
    pub external_key: String,
    /// Browse URL for the created issue
    pub external_url: String,
}

/// Per-ticket result of one export attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketOutcome {
    pub ticket_id: String,
    pub outcome: IssueOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueOutcome {
    Created { issue: IssueRef },
    Failed { reason: String },
}

impl TicketOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, IssueOutcome::Created { .. })
    }
}

/// Which phase of the export is currently ticking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPhase {
    GeneratingDetail,
    Sending,
}

/// Batch-granular progress, emitted after each batch settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportProgress {
    pub phase: ExportPhase,
    pub done: usize,
    pub total: usize,
}

/// Caller-facing classification of a finished export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    /// Every attempted ticket was created (vacuously true for an empty job)
    Complete,
    /// Some tickets were created, some failed
    Partial,
    /// At least one ticket was attempted and none were created
    Failed,
    /// The first create call was rejected for lack of rights; the rest of
    /// the job was not dispatched
    PermissionDenied,
}

/// Aggregated result of one export invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub job_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per dispatched ticket, in dispatch order
    pub outcomes: Vec<TicketOutcome>,
    pub status: ExportStatus,
}

impl ExportReport {
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Deep link to the first successfully created issue, for the summary UI
    pub fn first_created_url(&self) -> Option<&str> {
        self.outcomes.iter().find_map(|o| match &o.outcome {
            IssueOutcome::Created { issue } => Some(issue.external_url.as_str()),
            IssueOutcome::Failed { .. } => None,
        })
    }

    /// One-line summary ("N of M tickets sent") for toasts/CLI output
    pub fn summary(&self) -> String {
        match self.status {
            ExportStatus::PermissionDenied => {
                "permission denied: not allowed to create issues in the target team".to_string()
            }
            _ => format!(
                "{} of {} tickets sent",
                self.succeeded_count(),
                self.outcomes.len()
            ),
        }
    }
}
