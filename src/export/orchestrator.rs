use chrono::Utc;
use tracing::{info, warn};

use super::run_in_batches;
use crate::detail::{DetailCache, DetailGenerator};
use crate::models::{
    ExportPhase, ExportProgress, ExportReport, ExportStatus, IssueOutcome, IssuePayload, IssueRef,
    TicketDraft, TicketOutcome,
};
use crate::tracker::{TrackerClient, TrackerError};

/// Fixed batch width for both generation and dispatch, chosen to respect
/// provider rate limits while bounding total latency
pub const EXPORT_BATCH_SIZE: usize = 3;

/// Configuration for one export invocation
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub batch_size: usize,
    /// Deep link to the source meeting, attached to every issue
    pub source_link_url: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: EXPORT_BATCH_SIZE,
            source_link_url: None,
        }
    }
}

/// Export selected ticket drafts to the tracker
///
/// Runs the job state machine: partition by cached detail, generate what is
/// missing in sequential concurrent batches through the single-flight cache,
/// build one payload per ticket (generated detail wins over draft fields),
/// then dispatch create-issue calls in the same batch pattern.
///
/// The first create-issue call goes out alone as a permission probe: if the
/// provider rejects it for lack of rights, the job aborts with that single
/// outcome instead of burning the rate limit on calls that will uniformly
/// fail. Every other failure is recorded per ticket and never stops
/// siblings or later batches. Detail-generation failures downgrade that
/// ticket's payload to its draft fields.
///
/// `on_progress` fires after each batch settles; `done` is monotonic within
/// each phase. The returned report holds exactly one outcome per selected
/// ticket (except after a permission abort) in dispatch order.
pub async fn export_tickets(
    selected: &[TicketDraft],
    tracker: &dyn TrackerClient,
    generator: &dyn DetailGenerator,
    cache: &DetailCache,
    config: &ExportConfig,
    mut on_progress: impl FnMut(ExportProgress),
) -> ExportReport {
    let job_id = uuid::Uuid::new_v4().to_string();
    let started_at = Utc::now();
    info!(job_id = %job_id, tickets = selected.len(), "starting export");

    // Partition by cached detail and generate what is missing
    let missing: Vec<&TicketDraft> = selected.iter().filter(|d| !cache.contains(&d.id)).collect();

    if !missing.is_empty() {
        let total = missing.len();
        info!(missing = total, "generating missing ticket detail");
        on_progress(ExportProgress {
            phase: ExportPhase::GeneratingDetail,
            done: 0,
            total,
        });

        let generated = run_in_batches(
            &missing,
            config.batch_size,
            |draft| async move {
                (draft.id.clone(), cache.get_or_generate(draft, generator).await)
            },
            |done| {
                on_progress(ExportProgress {
                    phase: ExportPhase::GeneratingDetail,
                    done,
                    total,
                })
            },
        )
        .await;

        for (ticket_id, result) in &generated {
            if let Err(err) = result {
                warn!(ticket_id = %ticket_id, error = %err, "detail generation failed, falling back to draft fields");
            }
        }
    }

    // Build payloads, preferring generated detail where it exists
    let payloads: Vec<(String, IssuePayload)> = selected
        .iter()
        .map(|draft| (draft.id.clone(), build_payload(draft, cache, config)))
        .collect();

    let total = payloads.len();
    let mut outcomes: Vec<TicketOutcome> = Vec::with_capacity(total);

    if total > 0 {
        on_progress(ExportProgress {
            phase: ExportPhase::Sending,
            done: 0,
            total,
        });

        // Permission probe: the first call goes out alone
        let (first_id, first_payload) = &payloads[0];
        let first_result = tracker.create_issue(first_payload).await;
        let permission_abort = matches!(&first_result, Err(err) if err.is_permission());
        outcomes.push(to_outcome(first_id, first_result));
        on_progress(ExportProgress {
            phase: ExportPhase::Sending,
            done: 1,
            total,
        });

        if permission_abort {
            warn!(job_id = %job_id, "permission denied on first create call, aborting remaining dispatch");
            return ExportReport {
                job_id,
                started_at,
                finished_at: Utc::now(),
                outcomes,
                status: ExportStatus::PermissionDenied,
            };
        }

        let rest = run_in_batches(
            &payloads[1..],
            config.batch_size,
            |(ticket_id, payload)| async move {
                to_outcome(ticket_id, tracker.create_issue(payload).await)
            },
            |done| {
                on_progress(ExportProgress {
                    phase: ExportPhase::Sending,
                    done: 1 + done,
                    total,
                })
            },
        )
        .await;
        outcomes.extend(rest);
    }

    let status = classify(&outcomes);
    let report = ExportReport {
        job_id,
        started_at,
        finished_at: Utc::now(),
        outcomes,
        status,
    };
    info!(job_id = %report.job_id, status = ?report.status, "{}", report.summary());
    report
}

/// One create-issue payload per ticket; generated detail is authoritative
/// when present, the draft is the fallback
fn build_payload(draft: &TicketDraft, cache: &DetailCache, config: &ExportConfig) -> IssuePayload {
    match cache.get(&draft.id) {
        Some(detail) => {
            let description = if detail.problem_statement.trim().is_empty() {
                detail.description
            } else {
                format!("{}\n\n{}", detail.problem_statement.trim(), detail.description)
            };
            IssuePayload {
                title: detail.title,
                description,
                priority: detail.priority,
                acceptance_criteria: detail.acceptance_criteria,
                source_link_url: config.source_link_url.clone(),
            }
        }
        None => IssuePayload {
            title: draft.title.clone(),
            description: draft.description.clone().unwrap_or_default(),
            priority: draft.priority,
            acceptance_criteria: draft.acceptance_criteria.clone().unwrap_or_default(),
            source_link_url: config.source_link_url.clone(),
        },
    }
}

fn to_outcome(ticket_id: &str, result: Result<IssueRef, TrackerError>) -> TicketOutcome {
    match result {
        Ok(issue) => TicketOutcome {
            ticket_id: ticket_id.to_string(),
            outcome: IssueOutcome::Created { issue },
        },
        Err(err) => TicketOutcome {
            ticket_id: ticket_id.to_string(),
            outcome: IssueOutcome::Failed {
                reason: err.to_string(),
            },
        },
    }
}

/// Caller-facing classification, derived purely from the outcome list
fn classify(outcomes: &[TicketOutcome]) -> ExportStatus {
    if outcomes.is_empty() {
        return ExportStatus::Complete;
    }
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    if succeeded == outcomes.len() {
        ExportStatus::Complete
    } else if succeeded > 0 {
        ExportStatus::Partial
    } else {
        ExportStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::detail::GenerationError;
    use crate::models::{Priority, TicketDetail};

    fn draft(id: &str) -> TicketDraft {
        TicketDraft {
            id: id.to_string(),
            title: format!("draft {id}"),
            priority: Priority::Med,
            description: Some(format!("draft description {id}")),
            acceptance_criteria: Some(vec![format!("criterion {id}")]),
            source_quotes: vec![],
        }
    }

    fn drafts(n: usize) -> Vec<TicketDraft> {
        (1..=n).map(|i| draft(&format!("t{i}"))).collect()
    }

    fn detail_for(id: &str) -> TicketDetail {
        TicketDetail {
            title: format!("detail {id}"),
            priority: Priority::High,
            status: "todo".to_string(),
            problem_statement: format!("problem {id}"),
            description: format!("detail description {id}"),
            acceptance_criteria: vec![format!("detail criterion {id}")],
            quotes: vec![],
        }
    }

    /// Generator that derives detail from the draft id, failing for
    /// configured ids
    struct StubGenerator {
        fail_ids: HashSet<String>,
    }

    impl StubGenerator {
        fn ok() -> Self {
            Self {
                fail_ids: HashSet::new(),
            }
        }
    }

    #[async_trait]
    impl DetailGenerator for StubGenerator {
        async fn generate(&self, draft: &TicketDraft) -> Result<TicketDetail, GenerationError> {
            if self.fail_ids.contains(&draft.id) {
                Err(GenerationError::Generator("model unavailable".to_string()))
            } else {
                Ok(detail_for(&draft.id))
            }
        }
    }

    /// Tracker that records dispatched titles and fails with a configured
    /// HTTP status per title
    struct StubTracker {
        calls: Mutex<Vec<String>>,
        fail_status: HashMap<String, u16>,
    }

    impl StubTracker {
        fn ok() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_status: HashMap::new(),
            }
        }

        fn failing(titles: &[(&str, u16)]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_status: titles
                    .iter()
                    .map(|(t, s)| (t.to_string(), *s))
                    .collect(),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TrackerClient for StubTracker {
        async fn validate_credentials(&self) -> Result<(), TrackerError> {
            Ok(())
        }

        async fn create_issue(&self, payload: &IssuePayload) -> Result<IssueRef, TrackerError> {
            self.calls.lock().unwrap().push(payload.title.clone());
            if let Some(&status) = self.fail_status.get(&payload.title) {
                let status = reqwest::StatusCode::from_u16(status).unwrap();
                return Err(TrackerError::from_status(status, "stubbed".to_string()));
            }
            Ok(IssueRef {
                external_id: format!("id-{}", payload.title),
                external_key: format!("ENG-{}", payload.title),
                external_url: format!("https://linear.app/issue/{}", payload.title),
            })
        }
    }

    async fn run(
        selected: &[TicketDraft],
        tracker: &StubTracker,
        generator: &StubGenerator,
        cache: &DetailCache,
    ) -> (ExportReport, Vec<ExportProgress>) {
        let mut events = Vec::new();
        let report = export_tickets(
            selected,
            tracker,
            generator,
            cache,
            &ExportConfig::default(),
            |p| events.push(p),
        )
        .await;
        (report, events)
    }

    #[tokio::test]
    async fn test_full_success() {
        let selected = drafts(4);
        let tracker = StubTracker::ok();
        let cache = DetailCache::new();

        let (report, _) = run(&selected, &tracker, &StubGenerator::ok(), &cache).await;

        assert_eq!(report.status, ExportStatus::Complete);
        assert_eq!(report.outcomes.len(), 4);
        assert!(report.outcomes.iter().all(|o| o.is_success()));
        assert_eq!(
            report.outcomes.iter().map(|o| o.ticket_id.as_str()).collect::<Vec<_>>(),
            vec!["t1", "t2", "t3", "t4"]
        );
        assert_eq!(report.summary(), "4 of 4 tickets sent");
    }

    #[tokio::test]
    async fn test_generation_progress_sequence() {
        let selected = drafts(7);
        let tracker = StubTracker::ok();
        let cache = DetailCache::new();

        let (_, events) = run(&selected, &tracker, &StubGenerator::ok(), &cache).await;

        let generation: Vec<usize> = events
            .iter()
            .filter(|e| e.phase == ExportPhase::GeneratingDetail)
            .map(|e| e.done)
            .collect();
        assert_eq!(generation, vec![0, 3, 6, 7]);
        assert!(events
            .iter()
            .filter(|e| e.phase == ExportPhase::GeneratingDetail)
            .all(|e| e.total == 7));

        // Send phase: probe first, then batches of 3
        let sending: Vec<usize> = events
            .iter()
            .filter(|e| e.phase == ExportPhase::Sending)
            .map(|e| e.done)
            .collect();
        assert_eq!(sending, vec![0, 1, 4, 7]);
    }

    #[tokio::test]
    async fn test_progress_monotonic() {
        let selected = drafts(7);
        let tracker = StubTracker::ok();
        let cache = DetailCache::new();

        let (_, events) = run(&selected, &tracker, &StubGenerator::ok(), &cache).await;

        for phase in [ExportPhase::GeneratingDetail, ExportPhase::Sending] {
            let done: Vec<usize> = events
                .iter()
                .filter(|e| e.phase == phase)
                .map(|e| e.done)
                .collect();
            assert!(done.windows(2).all(|w| w[0] <= w[1]), "{phase:?}: {done:?}");
        }
    }

    #[tokio::test]
    async fn test_permission_probe_aborts_job() {
        let selected = drafts(5);
        // Generated detail titles are what get dispatched
        let tracker = StubTracker::failing(&[("detail t1", 403)]);
        let cache = DetailCache::new();

        let (report, _) = run(&selected, &tracker, &StubGenerator::ok(), &cache).await;

        assert_eq!(report.status, ExportStatus::PermissionDenied);
        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.outcomes[0].is_success());
        // Nothing after the probe was dispatched
        assert_eq!(tracker.call_count(), 1);
        assert!(report.summary().starts_with("permission denied"));
    }

    #[tokio::test]
    async fn test_later_permission_error_does_not_abort() {
        let selected = drafts(4);
        let tracker = StubTracker::failing(&[("detail t3", 403)]);
        let cache = DetailCache::new();

        let (report, _) = run(&selected, &tracker, &StubGenerator::ok(), &cache).await;

        assert_eq!(report.status, ExportStatus::Partial);
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(tracker.call_count(), 4);
    }

    #[tokio::test]
    async fn test_partial_failures_aggregate() {
        let selected = drafts(5);
        let tracker = StubTracker::failing(&[("detail t2", 500), ("detail t4", 429)]);
        let cache = DetailCache::new();

        let (report, _) = run(&selected, &tracker, &StubGenerator::ok(), &cache).await;

        assert_eq!(report.status, ExportStatus::Partial);
        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(report.succeeded_count(), 3);
        let failed: Vec<&str> = report
            .outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.ticket_id.as_str())
            .collect();
        assert_eq!(failed, vec!["t2", "t4"]);
        assert_eq!(report.summary(), "3 of 5 tickets sent");
    }

    #[tokio::test]
    async fn test_all_failed_classification() {
        let selected = drafts(2);
        let tracker = StubTracker::failing(&[("detail t1", 500), ("detail t2", 500)]);
        let cache = DetailCache::new();

        let (report, _) = run(&selected, &tracker, &StubGenerator::ok(), &cache).await;

        assert_eq!(report.status, ExportStatus::Failed);
        assert_eq!(report.succeeded_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back_to_draft_fields() {
        let selected = drafts(3);
        let tracker = StubTracker::ok();
        let cache = DetailCache::new();
        let generator = StubGenerator {
            fail_ids: HashSet::from(["t2".to_string()]),
        };

        let (report, _) = run(&selected, &tracker, &generator, &cache).await;

        // The failed generation does not block the job; t2 ships with its
        // draft title while the others ship generated detail
        assert_eq!(report.status, ExportStatus::Complete);
        assert_eq!(
            *tracker.calls.lock().unwrap(),
            vec!["detail t1", "draft t2", "detail t3"]
        );
        assert!(cache.get("t2").is_none());
    }

    #[tokio::test]
    async fn test_cached_detail_skips_generation() {
        let selected = drafts(2);
        let tracker = StubTracker::ok();
        let cache = DetailCache::new();
        cache.insert("t1", detail_for("t1"));
        cache.insert("t2", detail_for("t2"));

        let generator = StubGenerator {
            // Would fail if invoked at all
            fail_ids: HashSet::from(["t1".to_string(), "t2".to_string()]),
        };

        let (report, events) = run(&selected, &tracker, &generator, &cache).await;

        assert_eq!(report.status, ExportStatus::Complete);
        // No generation phase when everything is already cached
        assert!(events
            .iter()
            .all(|e| e.phase != ExportPhase::GeneratingDetail));
    }

    #[tokio::test]
    async fn test_detail_fields_preferred_in_payload() {
        let cache = DetailCache::new();
        cache.insert("t1", detail_for("t1"));
        let config = ExportConfig {
            source_link_url: Some("https://example.com/meeting/7".to_string()),
            ..Default::default()
        };

        let payload = build_payload(&draft("t1"), &cache, &config);

        assert_eq!(payload.title, "detail t1");
        assert_eq!(payload.priority, Priority::High);
        assert!(payload.description.starts_with("problem t1"));
        assert!(payload.description.contains("detail description t1"));
        assert_eq!(payload.acceptance_criteria, vec!["detail criterion t1"]);
        assert_eq!(
            payload.source_link_url.as_deref(),
            Some("https://example.com/meeting/7")
        );
    }

    #[tokio::test]
    async fn test_draft_fallback_payload() {
        let cache = DetailCache::new();
        let payload = build_payload(&draft("t1"), &cache, &ExportConfig::default());

        assert_eq!(payload.title, "draft t1");
        assert_eq!(payload.priority, Priority::Med);
        assert_eq!(payload.description, "draft description t1");
        assert_eq!(payload.acceptance_criteria, vec!["criterion t1"]);
    }

    #[tokio::test]
    async fn test_empty_selection() {
        let tracker = StubTracker::ok();
        let cache = DetailCache::new();

        let (report, events) = run(&[], &tracker, &StubGenerator::ok(), &cache).await;

        assert_eq!(report.status, ExportStatus::Complete);
        assert!(report.outcomes.is_empty());
        assert!(events.is_empty());
        assert_eq!(tracker.call_count(), 0);
    }
}
