pub mod cache;

pub use cache::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{TicketDetail, TicketDraft};

/// Failure producing detail content for a ticket
///
/// Clone because the cache broadcasts a single result to every caller
/// waiting on the same id.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("detail generator failed: {0}")]
    Generator(String),
    /// The in-flight generation was dropped before producing a result
    #[error("detail generation was interrupted")]
    Interrupted,
}

/// Produces full ticket detail from a draft
///
/// Implementations must be safe to retry after a failure; nothing is
/// memoized on the error path.
#[async_trait]
pub trait DetailGenerator: Send + Sync {
    async fn generate(&self, draft: &TicketDraft) -> Result<TicketDetail, GenerationError>;
}
