//! Agent executor configuration.

use std::time::Duration;

/// Configuration surface for the Agent Executor and Evaluator (§6).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Directory holding `phase<N>_<agent_type>.md` / `phase<N>_evaluation.md`.
    pub prompts_root: String,
    /// External agent binary, resolved from PATH if not an absolute path.
    pub agent_binary: String,
    /// Upper bound on concurrent agent subprocesses.
    pub max_parallel_agents: usize,
    /// Wall-clock timeout per subprocess invocation.
    pub subprocess_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            prompts_root: ".claude/prompts_v2".to_string(),
            agent_binary: "agent".to_string(),
            max_parallel_agents: 5,
            subprocess_timeout: Duration::from_secs(300),
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            prompts_root: std::env::var("MVO_PROMPTS_ROOT").unwrap_or(default.prompts_root),
            agent_binary: std::env::var("MVO_AGENT_BINARY").unwrap_or(default.agent_binary),
            max_parallel_agents: std::env::var("MVO_MAX_PARALLEL_AGENTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_parallel_agents),
            subprocess_timeout: Duration::from_secs(
                std::env::var("MVO_SUBPROCESS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default.subprocess_timeout.as_secs()),
            ),
        }
    }

    /// Resolve the agent binary to an absolute path via `which`, falling
    /// back to the configured string so a misconfiguration surfaces as a
    /// subprocess spawn failure rather than a silent no-op.
    pub fn resolved_agent_binary(&self) -> String {
        which::which(&self.agent_binary)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| self.agent_binary.clone())
    }
}
