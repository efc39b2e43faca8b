//! Session State: the in-memory representation of a session, flushed
//! through the Atomic Store after every mutation.

use std::path::{Path, PathBuf};

use chrono::Utc;
use mvo_models::{Phase, PhaseStatus, Session};
use tracing::warn;

use crate::atomic::{read_json, write_json_atomic};
use crate::error::{StoreError, StoreResult};
use crate::validation::validate_session_id;

/// Owns one session's state on disk under `sessions_root/<id>/state.json`.
///
/// Single writer per session, per §4.2: callers must not share a
/// `SessionStore` across threads for mutation. Readers may safely observe
/// a consistent snapshot because of the atomic rename semantics of the
/// underlying store.
pub struct SessionStore {
    root: PathBuf,
    session: Session,
}

impl SessionStore {
    fn state_path(session_dir: &Path) -> PathBuf {
        session_dir.join("state.json")
    }

    pub fn session_dir(sessions_root: &Path, session_id: &str) -> PathBuf {
        sessions_root.join(session_id)
    }

    /// Validate the id, then load an existing session or create a fresh
    /// one with all phases `not_started`.
    pub fn load_or_create(sessions_root: &Path, session_id: &str) -> StoreResult<Self> {
        validate_session_id(session_id)?;
        let session_dir = Self::session_dir(sessions_root, session_id);
        std::fs::create_dir_all(&session_dir)?;

        let path = Self::state_path(&session_dir);
        let session = match read_json::<Session>(&path)? {
            Some(s) => s,
            None => {
                let fresh = Session::new(session_id);
                write_json_atomic(&path, &fresh)?;
                fresh
            }
        };

        Ok(Self {
            root: session_dir,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_dir_path(&self) -> &Path {
        &self.root
    }

    fn flush(&self) -> StoreResult<()> {
        write_json_atomic(&Self::state_path(&self.root), &self.session)
    }

    fn phase_mut(&mut self, n: u8) -> StoreResult<&mut Phase> {
        self.session
            .phase_mut(n)
            .ok_or(StoreError::PhaseOutOfRange(n))
    }

    /// I1: true iff n==0, or phase n-1 is completed.
    pub fn can_execute_phase(&self, n: u8) -> bool {
        self.session.can_execute_phase(n)
    }

    /// Allowed only from `not_started`/`failed`. A phase already
    /// `in_progress` or `completed` is a no-op that logs a warning and
    /// returns rather than erroring.
    pub fn mark_phase_started(&mut self, n: u8) -> StoreResult<()> {
        if !self.can_execute_phase(n) {
            let required = n.saturating_sub(1);
            return Err(StoreError::PrerequisiteNotMet {
                phase: n,
                required,
            });
        }

        let phase = self.phase_mut(n)?;
        if phase.status == PhaseStatus::InProgress || phase.status == PhaseStatus::Completed {
            warn!(phase = n, status = phase.status.as_str(), "mark_phase_started called on a phase that isn't startable, ignoring");
            return Ok(());
        }

        let attempt_number = phase.attempts.len() as u32 + 1;
        phase.attempts.push(mvo_models::Attempt::started(attempt_number));
        phase.status = PhaseStatus::InProgress;
        phase.started_at = Some(Utc::now());

        self.session.touch();
        self.flush()
    }

    /// Closes the last attempt and commits `result` as the phase's
    /// `current_result`. Idempotent: calling this twice with the same
    /// phase already `completed` updates the stored result in place
    /// without appending a new attempt (R2).
    pub fn mark_phase_completed(
        &mut self,
        n: u8,
        result: serde_json::Value,
        success: bool,
    ) -> StoreResult<()> {
        let now = Utc::now();
        let phase = self.phase_mut(n)?;

        if let Some(attempt) = phase.last_attempt_mut() {
            attempt.completed_at = Some(now);
            attempt.success = success;
            attempt.result = Some(result.clone());
        } else {
            // Completing a phase that was never started via
            // mark_phase_started: synthesize attempt 1 so the invariant
            // "attempts non-empty iff status != not_started" still holds.
            let mut attempt = mvo_models::Attempt::started(1);
            attempt.completed_at = Some(now);
            attempt.success = success;
            attempt.result = Some(result.clone());
            phase.attempts.push(attempt);
        }

        phase.status = if success {
            PhaseStatus::Completed
        } else {
            PhaseStatus::Failed
        };
        phase.completed_at = Some(now);
        if success {
            phase.current_result = Some(result);
        }

        self.session.touch();
        self.flush()
    }

    /// Returns a copy of `current_result`, or `None` if the phase has no
    /// completed result yet.
    pub fn get_phase_data(&self, n: u8) -> Option<serde_json::Value> {
        self.session.phase(n).and_then(|p| p.current_result.clone())
    }

    pub fn get_completed_phases(&self) -> Vec<u8> {
        let mut out: Vec<u8> = (0..mvo_models::PHASE_COUNT as u8)
            .filter(|&n| {
                self.session
                    .phase(n)
                    .map(|p| p.status == PhaseStatus::Completed)
                    .unwrap_or(false)
            })
            .collect();
        out.sort_unstable();
        out
    }

    pub fn get_pipeline_progress(&self) -> PipelineProgress {
        let completed = self.get_completed_phases();
        let total = mvo_models::PHASE_COUNT as u32;
        PipelineProgress {
            progress_percentage: (completed.len() as f64 / total as f64) * 100.0,
            current_phase: completed.iter().max().map(|&m| m + 1).unwrap_or(0),
            design_complete: completed.contains(&4),
            generation_complete: completed.contains(&9),
            completed_phases: completed,
            total_phases: total,
        }
    }

    pub fn validate_pipeline_state(&self) -> PipelineValidation {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        if !self.can_execute_phase(1) {
            issues.push("Phase 0 (audio analysis) not completed".to_string());
        }

        for n in 1..=4u8 {
            if let Some(data) = self.get_phase_data(n) {
                if data.get("winner").is_none() {
                    warnings.push(format!("Phase {n} completed but no winner found"));
                }
            }
        }

        if self.can_execute_phase(5) {
            if let Some(phase3) = self.get_phase_data(3) {
                let clips_empty = phase3
                    .get("winner")
                    .and_then(|w| w.get("clips"))
                    .and_then(|c| c.as_array())
                    .map(|a| a.is_empty())
                    .unwrap_or(true);
                if clips_empty {
                    warnings.push("Phase 3 has no clips defined".to_string());
                }
            }
        }

        PipelineValidation {
            valid: issues.is_empty(),
            issues,
            warnings,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineProgress {
    pub completed_phases: Vec<u8>,
    pub total_phases: u32,
    pub progress_percentage: f64,
    pub current_phase: u8,
    pub design_complete: bool,
    pub generation_complete: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineValidation {
    pub valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_session_phase_zero_can_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load_or_create(dir.path(), "sess-1").unwrap();
        assert!(store.can_execute_phase(0));
        assert!(!store.can_execute_phase(1));
    }

    #[test]
    fn mark_started_then_completed_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::load_or_create(dir.path(), "sess-1").unwrap();
        store.mark_phase_started(0).unwrap();
        store
            .mark_phase_completed(0, json!({"bpm": 120}), true)
            .unwrap();
        assert_eq!(store.get_phase_data(0), Some(json!({"bpm": 120})));
        assert!(store.can_execute_phase(1));
    }

    #[test]
    fn mark_started_twice_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::load_or_create(dir.path(), "sess-1").unwrap();
        store.mark_phase_started(0).unwrap();
        store.mark_phase_started(0).unwrap();
        assert_eq!(store.session().phase(0).unwrap().attempts.len(), 1);
    }

    #[test]
    fn mark_started_on_completed_phase_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::load_or_create(dir.path(), "sess-1").unwrap();
        store.mark_phase_started(0).unwrap();
        store
            .mark_phase_completed(0, json!({"bpm": 120}), true)
            .unwrap();

        store.mark_phase_started(0).unwrap();

        let phase = store.session().phase(0).unwrap();
        assert_eq!(phase.status, PhaseStatus::Completed);
        assert_eq!(phase.attempts.len(), 1);
        assert_eq!(store.get_phase_data(0), Some(json!({"bpm": 120})));
    }

    #[test]
    fn starting_phase_without_prerequisite_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::load_or_create(dir.path(), "sess-1").unwrap();
        assert!(store.mark_phase_started(2).is_err());
    }

    #[test]
    fn reloading_preserves_state() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = SessionStore::load_or_create(dir.path(), "sess-1").unwrap();
            store.mark_phase_started(0).unwrap();
            store
                .mark_phase_completed(0, json!({"bpm": 120}), true)
                .unwrap();
        }
        let reloaded = SessionStore::load_or_create(dir.path(), "sess-1").unwrap();
        assert_eq!(reloaded.get_phase_data(0), Some(json!({"bpm": 120})));
    }

    #[test]
    fn pipeline_progress_tracks_completed_phases() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::load_or_create(dir.path(), "sess-1").unwrap();
        store.mark_phase_started(0).unwrap();
        store.mark_phase_completed(0, json!({}), true).unwrap();
        let progress = store.get_pipeline_progress();
        assert_eq!(progress.completed_phases, vec![0]);
        assert_eq!(progress.current_phase, 1);
        assert!(!progress.design_complete);
    }

    #[test]
    fn validate_pipeline_flags_missing_phase_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load_or_create(dir.path(), "sess-1").unwrap();
        let v = store.validate_pipeline_state();
        assert!(!v.valid);
        assert!(!v.issues.is_empty());
    }
}
