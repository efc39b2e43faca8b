//! MV Orchestra's orchestrator: wires the Session State, Agent Executor,
//! Feedback Loop, Clip Generator, and post-production drivers into the
//! ten-phase pipeline.

pub mod audio_analysis;
pub mod backends;
pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod quality_gate;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::Orchestrator;
