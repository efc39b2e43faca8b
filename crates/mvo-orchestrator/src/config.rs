//! Orchestrator-level configuration: the session root, prompts root, and
//! the backend registry file, plus the per-crate configs it wires
//! together (§6).

use mvo_agents::AgentConfig;
use mvo_clipgen::ClipGenConfig;
use mvo_drivers::DriverConfig;
use mvo_feedback::FeedbackConfig;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub sessions_root: String,
    pub backends_file: String,
    pub agent: AgentConfig,
    pub feedback: FeedbackConfig,
    pub clipgen: ClipGenConfig,
    pub drivers: DriverConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            sessions_root: "sessions".to_string(),
            backends_file: "backends.json".to_string(),
            agent: AgentConfig::default(),
            feedback: FeedbackConfig::default(),
            clipgen: ClipGenConfig::default(),
            drivers: DriverConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            sessions_root: std::env::var("MVO_SESSIONS_ROOT").unwrap_or(default.sessions_root),
            backends_file: std::env::var("MVO_BACKENDS_FILE").unwrap_or(default.backends_file),
            agent: AgentConfig::from_env(),
            feedback: FeedbackConfig::from_env(),
            clipgen: ClipGenConfig::from_env(),
            drivers: DriverConfig::from_env(),
        }
    }
}
