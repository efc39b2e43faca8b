//! Store error types.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid session identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Prerequisite not met: phase {phase} requires phase {required} to be completed")]
    PrerequisiteNotMet { phase: u8, required: u8 },

    #[error("Phase {0} out of range (expected 0..=9)")]
    PhaseOutOfRange(u8),

    #[error("JSON serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn invalid_identifier(msg: impl Into<String>) -> Self {
        Self::InvalidIdentifier(msg.into())
    }

    /// Per §7, `InvalidIdentifier`/`PrerequisiteNotMet` are fatal to the
    /// call and never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }
}
