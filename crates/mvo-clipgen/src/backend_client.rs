//! Backend ("MCP server") invocation.
//!
//! Per §1, video-generation backends are opaque external collaborators;
//! this module's only responsibility is invoking them correctly. The
//! trait exists so tests and a real backend integration can both plug
//! into the same generator/retry machinery, mirroring the
//! `CLIPEvaluator`-as-trait seam used for Phase 6 (§4.9).

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use mvo_models::{BackendProfile, ClipDesign};
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::ClipGenError;

#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Invoke `backend` to generate one clip from `design`, writing the
    /// artifact somewhere under `output_dir`. Returns the artifact path
    /// on success.
    async fn generate(
        &self,
        backend: &BackendProfile,
        design: &ClipDesign,
        output_dir: &Path,
    ) -> Result<PathBuf, ClipGenError>;
}

/// Invokes the configured backend binary once per clip, following the
/// same stdin-JSON/stdout-JSON discipline as the Agent Executor (§4.3):
/// `<backend_binary> --endpoint <endpoint> --clip-id <id>`, context JSON
/// on stdin, `{"output_path": "..."}` JSON on stdout.
pub struct SubprocessBackendClient {
    binary: String,
    timeout: Duration,
}

impl SubprocessBackendClient {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl BackendClient for SubprocessBackendClient {
    async fn generate(
        &self,
        backend: &BackendProfile,
        design: &ClipDesign,
        output_dir: &Path,
    ) -> Result<PathBuf, ClipGenError> {
        std::fs::create_dir_all(output_dir)?;

        let request = json!({
            "clip_id": design.clip_id,
            "prompt": design.prompt,
            "duration": design.duration,
            "section": design.section,
        });

        let mut child = Command::new(&self.binary)
            .arg("--endpoint")
            .arg(&backend.endpoint)
            .arg("--clip-id")
            .arg(design.clip_id.to_string())
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload = serde_json::to_vec(&request).unwrap_or_default();
            stdin.write_all(&payload).await.ok();
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ClipGenError::SubprocessFailed("timed out".to_string()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClipGenError::SubprocessFailed(stderr.chars().take(200).collect()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let value: serde_json::Value = serde_json::from_str(stdout.trim())
            .map_err(|e| ClipGenError::SubprocessFailed(format!("unparsable backend output: {e}")))?;

        let path = value
            .get("output_path")
            .and_then(|p| p.as_str())
            .ok_or_else(|| ClipGenError::SubprocessFailed("missing output_path in backend response".to_string()))?;

        Ok(PathBuf::from(path))
    }
}
