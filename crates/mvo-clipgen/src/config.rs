//! Clip generator configuration.

use std::time::Duration;

/// Configuration surface for the Clip Generator (§6).
///
/// Per §4.6's grounded Open Question: the clip generator's own
/// `max_retries` default (2) is authoritative here; the global subprocess
/// constant (4) lives in `mvo-agents` instead, where no local override
/// exists.
#[derive(Debug, Clone)]
pub struct ClipGenConfig {
    pub max_parallel: usize,
    pub max_retries: u32,
    /// External backend binary, resolved from PATH if not absolute.
    pub backend_binary: String,
    pub subprocess_timeout: Duration,
    pub output_dir: String,
}

impl Default for ClipGenConfig {
    fn default() -> Self {
        Self {
            max_parallel: 3,
            max_retries: 2,
            backend_binary: "mvo-backend".to_string(),
            subprocess_timeout: Duration::from_secs(120),
            output_dir: "generated_clips".to_string(),
        }
    }
}

impl ClipGenConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_parallel: std::env::var("MVO_MAX_PARALLEL_CLIPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_parallel),
            max_retries: std::env::var("MVO_CLIP_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_retries),
            backend_binary: std::env::var("MVO_BACKEND_BINARY").unwrap_or(default.backend_binary),
            subprocess_timeout: Duration::from_secs(
                std::env::var("MVO_BACKEND_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default.subprocess_timeout.as_secs()),
            ),
            output_dir: std::env::var("MVO_CLIP_OUTPUT_DIR").unwrap_or(default.output_dir),
        }
    }
}
