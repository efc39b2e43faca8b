//! Driver configuration: external binary resolution and timeouts.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub ffmpeg_binary: String,
    pub ffprobe_binary: String,
    pub renderer_binary: String,
    pub ffmpeg_timeout: Duration,
    pub render_timeout: Duration,
    pub max_parallel_trims: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: "ffmpeg".to_string(),
            ffprobe_binary: "ffprobe".to_string(),
            renderer_binary: "remotion".to_string(),
            ffmpeg_timeout: Duration::from_secs(300),
            render_timeout: Duration::from_secs(600),
            max_parallel_trims: 3,
        }
    }
}

impl DriverConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            ffmpeg_binary: std::env::var("MVO_FFMPEG_BINARY").unwrap_or(default.ffmpeg_binary),
            ffprobe_binary: std::env::var("MVO_FFPROBE_BINARY").unwrap_or(default.ffprobe_binary),
            renderer_binary: std::env::var("MVO_RENDERER_BINARY").unwrap_or(default.renderer_binary),
            ffmpeg_timeout: Duration::from_secs(
                std::env::var("MVO_FFMPEG_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default.ffmpeg_timeout.as_secs()),
            ),
            render_timeout: Duration::from_secs(
                std::env::var("MVO_RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default.render_timeout.as_secs()),
            ),
            max_parallel_trims: std::env::var("MVO_MAX_PARALLEL_TRIMS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_parallel_trims),
        }
    }
}
