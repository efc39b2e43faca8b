//! Shared data models for MV Orchestra.
//!
//! This crate provides Serde-serializable types for:
//! - Session/Phase/Attempt state (the canonical `state.json` document)
//! - Agent submissions, evaluator selections, and feedback-loop iterations
//! - Clip designs and clip generation results
//! - Director profiles (the five competing design personas)
//! - Backend (MCP server) profiles used by the clip generator's selector
//! - The Phase 0 audio analysis placeholder document

pub mod audio;
pub mod backend;
pub mod clip;
pub mod director;
pub mod feedback;
pub mod session;

pub use audio::{AudioAnalysis, Section};
pub use backend::BackendProfile;
pub use clip::{ClipDesign, ClipResult, FallbackStrategy, GenerationStrategy};
pub use director::{DirectorProfile, DirectorType};
pub use feedback::{
    AgentSubmission, FeedbackRecord, IterationRecord, PartialAdoption, Selection,
};
pub use session::{Attempt, Phase, PhaseStatus, Session, PHASE_COUNT};
