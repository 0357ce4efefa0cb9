pub mod detail;
pub mod export;
pub mod io;
pub mod llm;
pub mod models;
pub mod tracker;
pub mod transcript;

pub use detail::{DetailCache, DetailGenerator, GenerationError};
pub use export::{export_tickets, run_in_batches, ExportConfig, EXPORT_BATCH_SIZE};
pub use io::{
    load_ticket_drafts, load_transcript_file, load_transcript_text, render_report,
    render_utterances, write_report,
};
pub use llm::{AnthropicConfig, AnthropicGenerator};
pub use models::{
    ExportPhase, ExportProgress, ExportReport, ExportStatus, IssueOutcome, IssuePayload, IssueRef,
    Priority, QuoteFragment, TicketDetail, TicketDraft, TicketOutcome, Utterance,
};
pub use tracker::{LinearClient, TrackerClient, TrackerError};
pub use transcript::{parse_transcript, resolve_quote};
