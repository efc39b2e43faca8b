//! Clip generator error types.

use thiserror::Error;

pub type ClipGenResult<T> = Result<T, ClipGenError>;

#[derive(Debug, Error)]
pub enum ClipGenError {
    #[error("No backend available matching clip requirements")]
    BackendUnavailable,

    #[error("Backend '{0}' exhausted all retries")]
    BackendExhausted(String),

    #[error("Backend subprocess failed: {0}")]
    SubprocessFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
