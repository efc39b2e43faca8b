//! Agent Executor: launches external agent processes and collects their
//! structured output.
//!
//! Per-agent contract (§4.3): `<agent_binary> -p <prompt_path>
//! --dangerous-skip-permission --output-format json`, context on stdin as
//! a single JSON object, stdout parsed as a single JSON object with a
//! bracket-balanced salvage fallback if strict parsing fails.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use regex::Regex;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::config::AgentConfig;
use crate::error::AgentError;

/// Outcome of running a single agent (director) once.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AgentOutcome {
    pub director_type: String,
    pub success: bool,
    pub output: Value,
    pub execution_time_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentOutcome {
    fn failed(director_type: &str, execution_time_s: f64, error: impl Into<String>) -> Self {
        Self {
            director_type: director_type.to_string(),
            success: false,
            output: Value::Null,
            execution_time_s,
            error: Some(error.into()),
        }
    }
}

/// Runs agent subprocesses and parses their output.
pub struct AgentExecutor {
    config: AgentConfig,
}

impl AgentExecutor {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    fn prompt_path(&self, phase: u8, agent_type: &str) -> PathBuf {
        Path::new(&self.config.prompts_root).join(format!("phase{phase}_{agent_type}.md"))
    }

    /// Run one director/agent and return its outcome. Never returns an
    /// `Err` — all failure modes become a `success=false` outcome, per the
    /// "never throws due to an individual agent's failure" contract.
    pub async fn run_director(
        &self,
        phase: u8,
        agent_type: &str,
        context: &Value,
        output_dir: &Path,
    ) -> AgentOutcome {
        let start = Instant::now();
        let prompt_path = self.prompt_path(phase, agent_type);

        if !prompt_path.exists() {
            return AgentOutcome::failed(
                agent_type,
                start.elapsed().as_secs_f64(),
                "prompt missing",
            );
        }

        if let Err(e) = std::fs::create_dir_all(output_dir) {
            return AgentOutcome::failed(agent_type, start.elapsed().as_secs_f64(), e.to_string());
        }
        let context_sidecar = output_dir.join(format!("{agent_type}_context.json"));
        let _ = std::fs::write(
            &context_sidecar,
            serde_json::to_vec_pretty(context).unwrap_or_default(),
        );

        match self.launch(&prompt_path, context).await {
            Ok(raw_stdout) => match parse_agent_output(&raw_stdout) {
                Ok(output) => AgentOutcome {
                    director_type: agent_type.to_string(),
                    success: true,
                    output,
                    execution_time_s: start.elapsed().as_secs_f64(),
                    error: None,
                },
                Err(e) => AgentOutcome::failed(agent_type, start.elapsed().as_secs_f64(), e.to_string()),
            },
            Err(e) => AgentOutcome::failed(agent_type, start.elapsed().as_secs_f64(), e.to_string()),
        }
    }

    /// Launch the configured agent binary against `prompt_path` with
    /// `context` piped to stdin. Shared by per-director runs and the
    /// Evaluator, which uses the same subprocess contract against a
    /// different prompt-file convention.
    pub(crate) async fn launch(&self, prompt_path: &Path, context: &Value) -> Result<String, AgentError> {
        let binary = self.config.resolved_agent_binary();
        let mut child = Command::new(&binary)
            .arg("-p")
            .arg(prompt_path)
            .arg("--dangerous-skip-permission")
            .arg("--output-format")
            .arg("json")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload = serde_json::to_vec(context).unwrap_or_default();
            stdin.write_all(&payload).await.ok();
        }

        let output = tokio::time::timeout(self.config.subprocess_timeout, child.wait_with_output())
            .await
            .map_err(|_| AgentError::SubprocessFailed("timed out".to_string()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AgentError::SubprocessFailed(truncate(&stderr, 200)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run every agent in `agents` concurrently, bounded by
    /// `max_parallel_agents`, returning outcomes aligned to input order
    /// regardless of completion order (C1).
    pub async fn run_all(
        &self,
        phase: u8,
        context: &Value,
        output_dir: &Path,
        agents: &[String],
    ) -> Vec<AgentOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_agents.max(1)));
        let mut handles = Vec::with_capacity(agents.len());

        for agent_type in agents {
            let permit = Arc::clone(&semaphore);
            let phase = phase;
            let context = context.clone();
            let output_dir = output_dir.to_path_buf();
            let agent_type = agent_type.clone();
            let config = self.config.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await;
                let executor = AgentExecutor::new(config);
                executor.run_director(phase, &agent_type, &context, &output_dir).await
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (handle, agent_type) in handles.into_iter().zip(agents.iter()) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => outcomes.push(AgentOutcome::failed(agent_type, 0.0, e.to_string())),
            }
        }
        outcomes
    }
}

/// Strict JSON parse first; on failure, fall back to a bracket-balanced
/// salvage parse (first `{` to last `}`), since the external binary may
/// emit preamble text before its JSON object.
pub fn parse_agent_output(raw: &str) -> Result<Value, AgentError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Ok(value);
    }

    let salvage = Regex::new(r"(?s)\{.*\}").expect("static regex is valid");
    if let Some(m) = salvage.find(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(m.as_str()) {
            warn!("agent output required salvage parse; treat preamble as a protocol violation");
            return Ok(value);
        }
    }

    Err(AgentError::OutputUnparsable(truncate(raw, 200)))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_clean_json() {
        let value = parse_agent_output(r#"{"a": 1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn salvages_json_with_preamble() {
        let raw = "Thinking...\n{\"a\": 1}\nDone.";
        let value = parse_agent_output(raw).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn unparsable_output_is_truncated_error() {
        let raw = "x".repeat(500);
        let err = parse_agent_output(&raw).unwrap_err();
        assert!(matches!(err, AgentError::OutputUnparsable(_)));
        if let AgentError::OutputUnparsable(msg) = err {
            assert_eq!(msg.chars().count(), 200);
        }
    }
}
