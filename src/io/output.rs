use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{ExportReport, IssueOutcome, Utterance};

/// Write the machine-readable export report as JSON
pub fn write_report(report: &ExportReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write report: {:?}", path))?;
    Ok(())
}

/// Render the human-readable export summary
///
/// Three shapes, derived purely from the outcome list: full success,
/// partial success with counts, failure with a specific reason.
pub fn render_report(report: &ExportReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", report.summary()));

    for outcome in &report.outcomes {
        match &outcome.outcome {
            IssueOutcome::Created { issue } => {
                out.push_str(&format!(
                    "  {} -> {} ({})\n",
                    outcome.ticket_id, issue.external_key, issue.external_url
                ));
            }
            IssueOutcome::Failed { reason } => {
                out.push_str(&format!("  {} -> failed: {}\n", outcome.ticket_id, reason));
            }
        }
    }

    if let Some(url) = report.first_created_url() {
        out.push_str(&format!("First created issue: {}\n", url));
    }

    out
}

/// Render parsed utterances for terminal display
pub fn render_utterances(utterances: &[Utterance]) -> String {
    let mut out = String::new();
    for u in utterances {
        if u.is_anonymous() {
            out.push_str(&format!("[{}] {}\n", u.index, u.text));
        } else {
            out.push_str(&format!("[{}] {}: {}\n", u.index, u.speaker, u.text));
        }
    }
    out
}
