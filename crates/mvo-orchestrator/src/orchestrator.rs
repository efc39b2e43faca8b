//! The Orchestrator (§2 component 8): validates prerequisites, dispatches
//! to the Feedback Loop (P1-P4) or the Clip Generator/driver wrappers
//! (P5-P9), then commits results through the Session State.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use mvo_agents::{AgentExecutor, Evaluator};
use mvo_clipgen::{BackendSelector, ClipGenerator, SubprocessBackendClient};
use mvo_drivers::{MergeSpec, RenderConfig, RenderResult, Renderer, TransitionType, TrimSpec, VideoEditor};
use mvo_feedback::FeedbackLoop;
use mvo_models::{BackendProfile, ClipDesign, ClipResult, DirectorType, GenerationStrategy};
use mvo_store::SessionStore;
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::audio_analysis::analyze_audio;
use crate::config::OrchestratorConfig;
use crate::context::{build_context, PHASE_CLIP_DESIGN, PHASE_MCP_GENERATION, PHASE_REFINEMENT};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::quality_gate::{FfprobeQualityChecker, QualityChecker};

/// The three effects-generator personas dispatched for Phase 8. Phase 8 is
/// otherwise run the same way as a design phase (single-round agent
/// competition + evaluation), reusing the Feedback Loop machinery with
/// `max_iterations = 1` rather than a separate controller.
const PHASE_8_AGENTS: [&str; 3] = ["minimalist", "creative", "balanced"];

pub struct Orchestrator {
    store: SessionStore,
    config: OrchestratorConfig,
    cancel: watch::Receiver<bool>,
}

impl Orchestrator {
    pub fn new(
        sessions_root: &Path,
        session_id: &str,
        config: OrchestratorConfig,
        cancel: watch::Receiver<bool>,
    ) -> OrchestratorResult<Self> {
        let store = SessionStore::load_or_create(sessions_root, session_id)?;
        Ok(Self { store, config, cancel })
    }

    fn session_dir(&self) -> PathBuf {
        self.store.session_dir_path().to_path_buf()
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Phase 0: validate the audio file and persist the placeholder
    /// analysis document.
    pub fn run_audio_analysis(&mut self, audio_file: &Path) -> OrchestratorResult<Value> {
        if self.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        if !self.store.can_execute_phase(0) {
            return Err(OrchestratorError::PrerequisiteNotMet { phase: 0, required: 0 });
        }

        self.store.mark_phase_started(0)?;
        let analysis = analyze_audio(audio_file)?;
        let result = serde_json::to_value(&analysis)?;
        self.store.mark_phase_completed(0, result.clone(), true)?;

        info!(duration_s = analysis.duration_s, bpm = analysis.bpm, "phase 0 complete");
        Ok(result)
    }

    /// Run one design phase (1-4) end-to-end: build context, run the
    /// feedback loop across the five director personas, persist the
    /// result.
    pub async fn run_design_phase(&mut self, phase_num: u8) -> OrchestratorResult<Value> {
        self.run_competitive_phase(phase_num, &DirectorType::ALL.map(|d| d.as_str().to_string()), None)
            .await
    }

    /// Run design phases `start..=end` in order (§"Orchestrator").
    pub async fn run_design_phases(&mut self, start: u8, end: u8) -> OrchestratorResult<Vec<Value>> {
        let mut results = Vec::new();
        for phase_num in start..=end {
            results.push(self.run_design_phase(phase_num).await?);
        }
        Ok(results)
    }

    /// Phase 8: effects-code competition, run the same way as a design
    /// phase but capped at one iteration (no quality threshold gating).
    pub async fn run_effects_phase(&mut self) -> OrchestratorResult<Value> {
        let agents: Vec<String> = PHASE_8_AGENTS.iter().map(|s| s.to_string()).collect();
        self.run_competitive_phase(8, &agents, Some(1)).await
    }

    async fn run_competitive_phase(
        &mut self,
        phase_num: u8,
        agents: &[String],
        max_iterations_override: Option<u32>,
    ) -> OrchestratorResult<Value> {
        if self.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        if !self.store.can_execute_phase(phase_num) {
            return Err(OrchestratorError::PrerequisiteNotMet {
                phase: phase_num,
                required: phase_num.saturating_sub(1),
            });
        }

        self.store.mark_phase_started(phase_num)?;

        let context = build_context(&self.store, phase_num);
        let output_dir = self.session_dir().join(format!("phase{phase_num}"));
        std::fs::create_dir_all(&output_dir)?;

        let mut feedback_config = self.config.feedback.clone();
        if let Some(max_iterations) = max_iterations_override {
            feedback_config.max_iterations = max_iterations;
        }

        let feedback_loop = FeedbackLoop::new(
            feedback_config,
            AgentExecutor::new(self.config.agent.clone()),
            Evaluator::new(self.config.agent.clone()),
        );

        info!(phase = phase_num, "running feedback loop");
        let result = feedback_loop
            .run_with_feedback(phase_num, context, &output_dir, agents)
            .await?;

        let result_data = json!({
            "phase": phase_num,
            "winner": result.final_result,
            "winner_name": result.winner_name,
            "iterations": result.iteration_count,
            "final_score": result.final_score,
            "improvement": result.total_improvement,
            "timestamp": Utc::now().to_rfc3339(),
        });

        std::fs::write(
            output_dir.join("results.json"),
            serde_json::to_vec_pretty(&result_data)?,
        )?;

        self.store.mark_phase_completed(phase_num, result_data.clone(), true)?;

        info!(
            phase = phase_num,
            winner = %result.winner_name,
            score = result.final_score,
            iterations = result.iteration_count,
            "phase complete"
        );

        Ok(result_data)
    }

    /// Phase 5: generate every clip the Phase 4 winner designed.
    pub async fn run_clip_generation(&mut self) -> OrchestratorResult<Vec<ClipResult>> {
        if self.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        if !self.store.can_execute_phase(PHASE_MCP_GENERATION) {
            return Err(OrchestratorError::PrerequisiteNotMet {
                phase: PHASE_MCP_GENERATION,
                required: PHASE_REFINEMENT,
            });
        }

        self.store.mark_phase_started(PHASE_MCP_GENERATION)?;

        let (designs, strategies) = self.extract_clip_designs()?;

        let registry = crate::backends::load_backend_registry(Path::new(&self.config.backends_file))?;
        let selector = BackendSelector::new(registry);
        let client: Arc<dyn mvo_clipgen::BackendClient> = Arc::new(SubprocessBackendClient::new(
            self.config.clipgen.backend_binary.clone(),
            self.config.clipgen.subprocess_timeout,
        ));
        let generator = ClipGenerator::new(self.config.clipgen.clone(), selector, client);

        let output_dir = self.session_dir().join("phase5");
        std::fs::create_dir_all(&output_dir)?;

        let results = generator.generate_all(&designs, &strategies).await;
        let result_data = json!({ "clips": results });

        let all_succeeded = results.iter().all(|r| r.success);
        self.store
            .mark_phase_completed(PHASE_MCP_GENERATION, result_data, all_succeeded)?;

        Ok(results)
    }

    fn extract_clip_designs(&self) -> OrchestratorResult<(Vec<ClipDesign>, Vec<Option<GenerationStrategy>>)> {
        let phase3 = self.store.get_phase_data(PHASE_CLIP_DESIGN).unwrap_or(Value::Null);
        let clips_value = phase3.get("winner").and_then(|w| w.get("clips")).cloned().unwrap_or(json!([]));

        let designs: Vec<ClipDesign> = serde_json::from_value(clips_value).unwrap_or_default();
        let strategies = designs.iter().map(|d| d.strategy.clone()).collect();
        Ok((designs, strategies))
    }

    /// Phase 6: technical quality gate over every successfully generated
    /// clip.
    pub async fn run_quality_gate(&mut self, clips: &[ClipResult]) -> OrchestratorResult<Value> {
        if self.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        if !self.store.can_execute_phase(6) {
            return Err(OrchestratorError::PrerequisiteNotMet { phase: 6, required: 5 });
        }

        self.store.mark_phase_started(6)?;

        let checker = FfprobeQualityChecker::new(self.config.drivers.clone(), 0.8);
        let (designs, _) = self.extract_clip_designs()?;

        let mut check_results = Vec::new();
        for clip in clips.iter().filter(|c| c.success) {
            let Some(design) = designs.iter().find(|d| d.clip_id == clip.clip_id) else {
                continue;
            };
            let Some(path) = clip.output_path.as_deref() else { continue };
            check_results.push(checker.check(Path::new(path), design).await);
        }

        let all_pass = check_results.iter().all(|r| r.meets_threshold);
        let result_data = json!({ "checks": check_results });
        self.store.mark_phase_completed(6, result_data.clone(), all_pass)?;

        if !all_pass {
            warn!("one or more clips failed the technical quality gate");
        }

        Ok(result_data)
    }

    /// Phase 7: trim each clip to its design window, then merge in order.
    pub async fn run_video_editing(&mut self, clips: &[ClipResult]) -> OrchestratorResult<Value> {
        if self.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        if !self.store.can_execute_phase(7) {
            return Err(OrchestratorError::PrerequisiteNotMet { phase: 7, required: 6 });
        }

        self.store.mark_phase_started(7)?;

        let (designs, _) = self.extract_clip_designs()?;
        let editor = VideoEditor::new(self.config.drivers.clone());
        let output_dir = self.session_dir().join("phase7");
        std::fs::create_dir_all(&output_dir)?;

        let mut trim_specs = Vec::new();
        for clip in clips.iter().filter(|c| c.success) {
            let Some(design) = designs.iter().find(|d| d.clip_id == clip.clip_id) else {
                continue;
            };
            let Some(input_path) = clip.output_path.as_deref() else { continue };
            trim_specs.push(TrimSpec {
                clip_id: clip.clip_id,
                input_path: PathBuf::from(input_path),
                output_path: output_dir.join(format!("trimmed_{}.mp4", clip.clip_id)),
                start_time: 0.0,
                duration: design.duration,
            });
        }

        let trim_results = editor.trim_all(&trim_specs).await;
        let trimmed_paths: Vec<PathBuf> = trim_specs
            .iter()
            .zip(trim_results.iter())
            .filter(|(_, r)| r.success)
            .map(|(spec, _)| spec.output_path.clone())
            .collect();

        let merge_result = editor
            .merge_clips(&MergeSpec {
                clips: trimmed_paths,
                output_path: output_dir.join("merged.mp4"),
                transition_duration: 1.0,
                transition_type: TransitionType::Crossfade,
            })
            .await;

        let result_data = json!({ "trims": trim_results, "merge": merge_result });
        self.store.mark_phase_completed(7, result_data.clone(), merge_result.success)?;

        Ok(result_data)
    }

    /// Phase 9: final render via the configured renderer binary.
    pub async fn run_render(&mut self, input_props_path: &Path) -> OrchestratorResult<RenderResult> {
        if self.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        if !self.store.can_execute_phase(9) {
            return Err(OrchestratorError::PrerequisiteNotMet { phase: 9, required: 8 });
        }

        self.store.mark_phase_started(9)?;

        let output_dir = self.session_dir().join("phase9");
        std::fs::create_dir_all(&output_dir)?;

        let renderer = Renderer::new(self.config.drivers.clone());
        let render_config = RenderConfig {
            composition_id: "main".to_string(),
            input_props_path: input_props_path.to_path_buf(),
            output_path: output_dir.join("final.mp4"),
            width: 1920,
            height: 1080,
            fps: 30,
            codec: "h264".to_string(),
            crf: 18,
        };

        let result = renderer.render(&render_config).await;
        let result_data = serde_json::to_value(&result)?;
        self.store.mark_phase_completed(9, result_data, result.success)?;

        Ok(result)
    }

    pub fn session_summary(&self) -> Value {
        json!({
            "session_id": self.store.session().session_id,
            "progress": self.store.get_pipeline_progress(),
            "validation": self.store.validate_pipeline_state(),
        })
    }

    /// Unused in the default registry wiring but kept for callers that
    /// want to override a single backend's availability without
    /// reloading the whole registry file (e.g. a CLI `--disable-backend`
    /// flag).
    pub fn backend_registry_path(&self) -> PathBuf {
        PathBuf::from(&self.config.backends_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A `BackendProfile` for tests that need one without going through
    /// the registry file.
    fn test_backend(name: &str) -> BackendProfile {
        BackendProfile {
            name: name.to_string(),
            endpoint: format!("mcp://{name}"),
            capabilities: vec!["general".to_string()],
            priority: 1,
            cost_per_clip: 0.1,
            available: true,
        }
    }

    fn cancel_channel() -> watch::Receiver<bool> {
        let (_, rx) = watch::channel(false);
        rx
    }

    #[test]
    fn new_orchestrator_creates_a_fresh_session() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            dir.path(),
            "sess-1",
            OrchestratorConfig::default(),
            cancel_channel(),
        )
        .unwrap();
        let summary = orchestrator.session_summary();
        assert_eq!(summary["session_id"], "sess-1");
    }

    #[test]
    fn phase_0_rejects_missing_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = Orchestrator::new(
            dir.path(),
            "sess-1",
            OrchestratorConfig::default(),
            cancel_channel(),
        )
        .unwrap();
        let err = orchestrator
            .run_audio_analysis(Path::new("/nonexistent/song.mp3"))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::AudioFileNotFound(_)));
    }

    #[test]
    fn phase_0_succeeds_for_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let audio_path = dir.path().join("song.mp3");
        std::fs::write(&audio_path, b"bytes").unwrap();

        let mut orchestrator = Orchestrator::new(
            dir.path(),
            "sess-1",
            OrchestratorConfig::default(),
            cancel_channel(),
        )
        .unwrap();
        let result = orchestrator.run_audio_analysis(&audio_path).unwrap();
        assert_eq!(result["bpm"], 120);
    }

    #[test]
    fn cancelled_before_start_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let mut orchestrator =
            Orchestrator::new(dir.path(), "sess-1", OrchestratorConfig::default(), rx).unwrap();
        let err = orchestrator
            .run_audio_analysis(Path::new("/nonexistent/song.mp3"))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Cancelled));
    }

    #[test]
    fn design_phase_rejects_when_phase_zero_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            dir.path(),
            "sess-1",
            OrchestratorConfig::default(),
            cancel_channel(),
        )
        .unwrap();
        assert!(!orchestrator.store.can_execute_phase(1));
        let _ = test_backend("x");
    }
}
