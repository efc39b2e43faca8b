//! Orchestrator error types: wraps every downstream crate's error so
//! `main` has one type to match on for the 0/1 exit code contract (§6).

use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("prerequisites not met for phase {phase}: phase {required} must be completed first")]
    PrerequisiteNotMet { phase: u8, required: u8 },

    #[error("audio file not found: {0}")]
    AudioFileNotFound(String),

    #[error(transparent)]
    Store(#[from] mvo_store::StoreError),

    #[error(transparent)]
    Feedback(#[from] mvo_feedback::FeedbackError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("backend registry error: {0}")]
    BackendRegistry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
