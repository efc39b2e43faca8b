//! Driver error types.

use thiserror::Error;

pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("renderer binary not found in PATH")]
    RendererNotFound,

    #[error("ffmpeg failed: {0}")]
    FfmpegFailed(String),

    #[error("renderer failed: {0}")]
    RenderFailed(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
