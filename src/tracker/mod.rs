pub mod linear;

pub use linear::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{IssuePayload, IssueRef};

/// Tracker failure classified the way the orchestrator branches on it
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Credentials invalid or expired; the caller must re-authenticate
    #[error("tracker credentials were rejected")]
    Unauthorized,
    /// Authenticated but not allowed to create issues in the target team
    #[error("not permitted to create issues in the target team")]
    Forbidden,
    #[error("tracker rate limit exceeded")]
    RateLimited,
    /// Any other provider-reported failure
    #[error("tracker responded with {status}: {message}")]
    Api { status: u16, message: String },
    /// Request never produced a provider response
    #[error("tracker request failed: {0}")]
    Transport(String),
}

impl TrackerError {
    /// Map an HTTP status to the error taxonomy
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 => TrackerError::Unauthorized,
            403 => TrackerError::Forbidden,
            429 => TrackerError::RateLimited,
            status => TrackerError::Api { status, message },
        }
    }

    /// Permission-class errors trigger the orchestrator's early abort
    pub fn is_permission(&self) -> bool {
        matches!(self, TrackerError::Forbidden)
    }
}

/// Thin per-provider client contract the orchestrator depends on
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Cheap credential check, run before any export is attempted
    async fn validate_credentials(&self) -> Result<(), TrackerError>;

    /// Create one issue from a provider-neutral payload
    async fn create_issue(&self, payload: &IssuePayload) -> Result<IssueRef, TrackerError>;
}
