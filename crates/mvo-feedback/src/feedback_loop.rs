//! The Feedback Loop controller (§4.5): iterates agent-run + evaluation
//! within a single design phase until the evaluator's score clears the
//! quality threshold or the iteration cap is reached.

use std::path::Path;

use mvo_agents::{AgentExecutor, Evaluator};
use mvo_models::{FeedbackRecord, IterationRecord, PartialAdoption};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::FeedbackConfig;
use crate::error::{FeedbackError, FeedbackResult};

/// `{winner_name, final_result, final_score, iteration_count,
/// total_improvement}` from §4.5 — the feedback loop never throws due to
/// a low score, only due to `NoViableSubmissions`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FeedbackLoopResult {
    pub winner_name: String,
    pub final_result: Value,
    pub final_score: f64,
    pub iteration_count: u32,
    pub total_improvement: f64,
    pub iterations: Vec<IterationRecord>,
}

pub struct FeedbackLoop {
    config: FeedbackConfig,
    executor: AgentExecutor,
    evaluator: Evaluator,
}

impl FeedbackLoop {
    pub fn new(config: FeedbackConfig, executor: AgentExecutor, evaluator: Evaluator) -> Self {
        Self {
            config,
            executor,
            evaluator,
        }
    }

    /// Run `run_with_feedback` for one design phase (§4.5).
    ///
    /// `agents` names the director types to compete in this phase; the
    /// caller (orchestrator) supplies `DirectorType::ALL` for phases 1-4.
    pub async fn run_with_feedback(
        &self,
        phase: u8,
        initial_context: Value,
        output_dir: &Path,
        agents: &[String],
    ) -> FeedbackResult<FeedbackLoopResult> {
        info!(
            phase,
            threshold = self.config.quality_threshold,
            max_iterations = self.config.max_iterations,
            "starting feedback loop"
        );

        let mut context = initial_context;
        let mut iterations: Vec<IterationRecord> = Vec::new();
        let mut previous_score = 0.0_f64;

        for iteration_num in 1..=self.config.max_iterations {
            let iter_dir = output_dir.join(format!("iteration_{iteration_num}"));

            let outcomes = self.executor.run_all(phase, &context, &iter_dir, agents).await;
            let submissions: Vec<mvo_models::AgentSubmission> = outcomes
                .iter()
                .map(|o| mvo_models::AgentSubmission {
                    director_type: o.director_type.clone(),
                    success: o.success,
                    output: o.output.clone(),
                    execution_time_s: o.execution_time_s,
                    error: o.error.clone(),
                })
                .collect();

            if !submissions.iter().any(|s| s.success) {
                warn!(phase, iteration_num, "no agent succeeded; aborting feedback loop");
                return Err(FeedbackError::NoViableSubmissions {
                    iteration: iteration_num,
                });
            }

            let selection = self
                .evaluator
                .evaluate_and_select(phase, &submissions, &context, &iter_dir)
                .await;
            let score = selection.score();
            let improvement = score - previous_score;

            info!(
                phase,
                iteration_num,
                winner = %selection.winner_name,
                score,
                improvement,
                "iteration complete"
            );

            let record = IterationRecord {
                iteration_num,
                submissions,
                selection: selection.clone(),
                score,
                improvement,
            };
            iterations.push(record.clone());

            if score >= self.config.quality_threshold {
                info!(phase, iteration_num, score, "quality threshold met");
                break;
            }

            if iteration_num < self.config.max_iterations {
                let feedback = self.synthesize_feedback(&selection, score);
                context = update_context_with_feedback(context, &feedback, &record);
                previous_score = score;
            } else {
                info!(phase, "max iterations reached without meeting threshold");
            }
        }

        let final_record = iterations
            .last()
            .expect("at least one iteration ran or NoViableSubmissions was returned above");

        let total_improvement = if iterations.len() > 1 {
            final_record.score - iterations[0].score
        } else {
            0.0
        };

        Ok(FeedbackLoopResult {
            winner_name: final_record.selection.winner_name.clone(),
            final_result: final_record.selection.winner_output.clone(),
            final_score: final_record.score,
            iteration_count: iterations.len() as u32,
            total_improvement,
            iterations,
        })
    }

    /// Feedback synthesis heuristics (§4.5): build the areas-to-improve
    /// and suggestion lists from the selection's score spread and partial
    /// adoptions.
    fn synthesize_feedback(&self, selection: &mvo_models::Selection, score: f64) -> FeedbackRecord {
        let mut areas_to_improve = Vec::new();

        if score < 60.0 {
            areas_to_improve.push("Overall quality needs significant improvement".to_string());
        } else if score < self.config.quality_threshold {
            areas_to_improve.push(format!(
                "Score needs to reach {}",
                self.config.quality_threshold
            ));
        }

        let max_score = selection.scores.values().cloned().fold(f64::MIN, f64::max);
        if max_score.is_finite() && max_score - score > 10.0 {
            areas_to_improve.push("Consider incorporating strengths from other submissions".to_string());
        }

        let suggestions: Vec<String> = selection
            .partial_adoptions
            .iter()
            .map(|a| format!("Consider adopting {} from {}", a.feature, a.from))
            .collect();

        FeedbackRecord {
            previous_winner: selection.winner_name.clone(),
            previous_score: score,
            evaluation_reasoning: selection.reasoning.clone(),
            areas_to_improve,
            partial_adoptions: selection.partial_adoptions.clone(),
            suggestions,
        }
    }
}

/// Context update rule (§4.5): append to `feedback_history[]`, set
/// `feedback` to the latest entry. This is the only mutation between
/// iterations — previous submissions are not re-fed to the agents.
fn update_context_with_feedback(
    mut context: Value,
    feedback: &FeedbackRecord,
    record: &IterationRecord,
) -> Value {
    if !context.is_object() {
        context = json!({});
    }
    let map = context.as_object_mut().expect("forced to object above");

    let history = map
        .entry("feedback_history")
        .or_insert_with(|| json!([]));
    if let Some(arr) = history.as_array_mut() {
        arr.push(json!({
            "iteration": record.iteration_num,
            "feedback": feedback,
            "score": record.score,
        }));
    }

    map.insert("feedback".to_string(), json!(feedback));
    context
}

/// A partial adoption suggestion string, exposed for callers building
/// downstream display without re-deriving the heuristic.
pub fn suggestion_for(adoption: &PartialAdoption) -> String {
    format!("Consider adopting {} from {}", adoption.feature, adoption.from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvo_agents::AgentConfig;
    use mvo_models::Selection;

    fn selection(winner: &str, scores: &[(&str, f64)]) -> Selection {
        Selection {
            winner_name: winner.to_string(),
            winner_output: json!({"text": winner}),
            scores: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            reasoning: "test".to_string(),
            partial_adoptions: Vec::new(),
        }
    }

    #[test]
    fn context_update_appends_feedback_history() {
        let feedback_loop = FeedbackLoop::new(
            FeedbackConfig::default(),
            AgentExecutor::new(AgentConfig::default()),
            Evaluator::new(AgentConfig::default()),
        );
        let sel = selection("alpha", &[("alpha", 60.0), ("beta", 55.0)]);
        let feedback = feedback_loop.synthesize_feedback(&sel, 60.0);
        assert!(feedback
            .areas_to_improve
            .contains(&"Score needs to reach 70".to_string()));

        let record = IterationRecord {
            iteration_num: 1,
            submissions: Vec::new(),
            selection: sel,
            score: 60.0,
            improvement: 0.0,
        };
        let context = update_context_with_feedback(json!({}), &feedback, &record);
        assert_eq!(
            context["feedback_history"].as_array().unwrap().len(),
            1
        );
        assert_eq!(context["feedback"]["previous_winner"], "alpha");
    }

    #[test]
    fn low_score_adds_significant_improvement_area() {
        let feedback_loop = FeedbackLoop::new(
            FeedbackConfig::default(),
            AgentExecutor::new(AgentConfig::default()),
            Evaluator::new(AgentConfig::default()),
        );
        let sel = selection("alpha", &[("alpha", 40.0)]);
        let feedback = feedback_loop.synthesize_feedback(&sel, 40.0);
        assert!(feedback
            .areas_to_improve
            .contains(&"Overall quality needs significant improvement".to_string()));
    }

    #[test]
    fn wide_score_spread_suggests_incorporating_strengths() {
        let feedback_loop = FeedbackLoop::new(
            FeedbackConfig::default(),
            AgentExecutor::new(AgentConfig::default()),
            Evaluator::new(AgentConfig::default()),
        );
        let sel = selection("alpha", &[("alpha", 65.0), ("beta", 80.0)]);
        let feedback = feedback_loop.synthesize_feedback(&sel, 65.0);
        assert!(feedback
            .areas_to_improve
            .iter()
            .any(|a| a.contains("incorporating strengths")));
    }

    #[test]
    fn partial_adoptions_become_suggestions() {
        let adoption = PartialAdoption {
            from: "beta".to_string(),
            feature: "color grading".to_string(),
            justification: None,
        };
        assert_eq!(
            suggestion_for(&adoption),
            "Consider adopting color grading from beta"
        );
    }
}
