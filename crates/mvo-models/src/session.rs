//! Session/Phase/Attempt state — the shape persisted as `state.json`.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Phases are numbered 0 (audio analysis) through 9 (final render).
pub const PHASE_COUNT: usize = 10;

/// Status of a single phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::NotStarted => "not_started",
            PhaseStatus::InProgress => "in_progress",
            PhaseStatus::Completed => "completed",
            PhaseStatus::Failed => "failed",
        }
    }
}

/// A single attempt at running a phase. Append-only within a phase.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Attempt {
    /// 1-based, monotonically increasing within a phase.
    pub attempt_number: u32,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Attempt {
    /// Start a new attempt; it has no outcome yet.
    pub fn started(attempt_number: u32) -> Self {
        Self {
            attempt_number,
            started_at: Utc::now(),
            completed_at: None,
            success: false,
            result: None,
            error: None,
        }
    }
}

/// State of one of the ten pipeline phases.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Phase {
    pub phase_number: u8,
    pub status: PhaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_result: Option<serde_json::Value>,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
}

impl Phase {
    pub fn new(phase_number: u8) -> Self {
        Self {
            phase_number,
            status: PhaseStatus::NotStarted,
            started_at: None,
            completed_at: None,
            current_result: None,
            attempts: Vec::new(),
        }
    }

    pub fn last_attempt(&self) -> Option<&Attempt> {
        self.attempts.last()
    }

    pub fn last_attempt_mut(&mut self) -> Option<&mut Attempt> {
        self.attempts.last_mut()
    }
}

/// The canonical per-session document, flushed through the Atomic Store
/// after every mutation (`state.json`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Session {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Keyed by phase number as a string, matching the stable `state.json`
    /// schema (`"0".."9"`), ordered for deterministic serialization.
    pub phases: BTreeMap<String, Phase>,
}

impl Session {
    /// Build a fresh session with all ten phases `not_started`.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        let mut phases = BTreeMap::new();
        for n in 0..PHASE_COUNT as u8 {
            phases.insert(n.to_string(), Phase::new(n));
        }
        Self {
            session_id: session_id.into(),
            created_at: now,
            updated_at: now,
            phases,
        }
    }

    pub fn phase(&self, n: u8) -> Option<&Phase> {
        self.phases.get(&n.to_string())
    }

    pub fn phase_mut(&mut self, n: u8) -> Option<&mut Phase> {
        self.phases.get_mut(&n.to_string())
    }

    /// I1: phase n>0 may start only if phase n-1 is completed.
    pub fn can_execute_phase(&self, n: u8) -> bool {
        if n == 0 {
            return true;
        }
        self.phase(n - 1)
            .map(|p| p.status == PhaseStatus::Completed)
            .unwrap_or(false)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_ten_not_started_phases() {
        let s = Session::new("abc123");
        assert_eq!(s.phases.len(), PHASE_COUNT);
        for n in 0..PHASE_COUNT as u8 {
            assert_eq!(s.phase(n).unwrap().status, PhaseStatus::NotStarted);
        }
    }

    #[test]
    fn can_execute_phase_follows_i1() {
        let mut s = Session::new("abc123");
        assert!(s.can_execute_phase(0));
        assert!(!s.can_execute_phase(1));
        s.phase_mut(0).unwrap().status = PhaseStatus::Completed;
        assert!(s.can_execute_phase(1));
        assert!(!s.can_execute_phase(2));
    }
}
