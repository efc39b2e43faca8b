//! Agent executor / evaluator error types.

use thiserror::Error;

pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Prompt missing: {0}")]
    PromptMissing(String),

    #[error("Subprocess failed: {0}")]
    SubprocessFailed(String),

    #[error("Output unparsable: {0}")]
    OutputUnparsable(String),

    #[error("No viable submissions")]
    NoViableSubmissions,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
