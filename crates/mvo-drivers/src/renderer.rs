//! Render driver (§4.7): wraps an external Remotion-style renderer binary,
//! streaming its stdout line-by-line for progress.

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};

/// Parameters handed to the renderer binary as a JSON request on stdin.
#[derive(Debug, Clone, Serialize)]
pub struct RenderConfig {
    pub composition_id: String,
    pub input_props_path: PathBuf,
    pub output_path: PathBuf,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_crf")]
    pub crf: u32,
}

fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    1080
}
fn default_fps() -> u32 {
    30
}
fn default_codec() -> String {
    "h264".to_string()
}
fn default_crf() -> u32 {
    18
}

/// Outcome of a render (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    pub duration_s: f64,
    pub render_time_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
}

pub struct Renderer {
    config: DriverConfig,
}

impl Renderer {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Spawns the renderer binary, writes `render_config` as JSON to its
    /// stdin, and streams stdout line-by-line as progress logs while
    /// waiting for it to exit.
    pub async fn render(&self, render_config: &RenderConfig) -> RenderResult {
        let started = Instant::now();

        match self.run(render_config).await {
            Ok(logs) => {
                let file_size_bytes = std::fs::metadata(&render_config.output_path).ok().map(|m| m.len());
                RenderResult {
                    success: true,
                    output_path: Some(render_config.output_path.to_string_lossy().into_owned()),
                    duration_s: 0.0,
                    render_time_s: started.elapsed().as_secs_f64(),
                    file_size_bytes,
                    error: None,
                    logs,
                }
            }
            Err(e) => {
                warn!(error = %e, "render failed");
                RenderResult {
                    success: false,
                    output_path: None,
                    duration_s: 0.0,
                    render_time_s: started.elapsed().as_secs_f64(),
                    file_size_bytes: None,
                    error: Some(e.to_string()),
                    logs: Vec::new(),
                }
            }
        }
    }

    async fn run(&self, render_config: &RenderConfig) -> DriverResult<Vec<String>> {
        which::which(&self.config.renderer_binary).map_err(|_| DriverError::RendererNotFound)?;

        let payload = serde_json::to_vec(render_config).map_err(|e| DriverError::RenderFailed(e.to_string()))?;

        let mut child = Command::new(&self.config.renderer_binary)
            .arg("render")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()?;

        {
            use tokio::io::AsyncWriteExt;
            let stdin = child.stdin.as_mut().ok_or_else(|| DriverError::RenderFailed("no stdin".to_string()))?;
            stdin.write_all(&payload).await?;
            stdin.shutdown().await?;
        }

        let stdout = child.stdout.take().ok_or_else(|| DriverError::RenderFailed("no stdout".to_string()))?;
        let mut reader = BufReader::new(stdout).lines();
        let mut logs = Vec::new();

        let wait_fut = async {
            while let Ok(Some(line)) = reader.next_line().await {
                debug!(renderer_line = %line, "renderer progress");
                logs.push(line);
            }
            child.wait().await
        };

        let status = tokio::time::timeout(self.config.render_timeout, wait_fut)
            .await
            .map_err(|_| DriverError::Timeout(self.config.render_timeout.as_secs()))??;

        if !status.success() {
            return Err(DriverError::RenderFailed(format!(
                "renderer exited with status {status}; last logs: {}",
                logs.iter().rev().take(5).cloned().collect::<Vec<_>>().join(" | ")
            )));
        }

        info!(output = %render_config.output_path.display(), "render complete");
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_config_defaults_match_hd_1080p30() {
        let json = serde_json::json!({
            "composition_id": "main",
            "input_props_path": "/tmp/props.json",
            "output_path": "/tmp/out.mp4"
        });
        let parsed: RenderConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.width, 1920);
        assert_eq!(parsed.height, 1080);
        assert_eq!(parsed.fps, 30);
        assert_eq!(parsed.codec, "h264");
        assert_eq!(parsed.crf, 18);
    }

    #[test]
    fn render_result_round_trips_through_json() {
        let result = RenderResult {
            success: true,
            output_path: Some("/tmp/out.mp4".to_string()),
            duration_s: 12.5,
            render_time_s: 3.2,
            file_size_bytes: Some(1024),
            error: None,
            logs: vec!["frame 1/300".to_string()],
        };
        let json = serde_json::to_string(&result).unwrap();
        let parsed: RenderResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.file_size_bytes, Some(1024));
        assert_eq!(parsed.logs.len(), 1);
    }
}
