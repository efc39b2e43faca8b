//! Evaluator & Selection (§4.4): aggregates N agent submissions into a
//! single winner, falling back to a deterministic heuristic if the
//! evaluator subprocess itself is unavailable or misbehaves.

use std::path::Path;

use mvo_models::{AgentSubmission, PartialAdoption, Selection};
use serde_json::{json, Value};
use tracing::warn;

use crate::config::AgentConfig;
use crate::executor::{parse_agent_output, AgentExecutor};

pub struct Evaluator {
    config: AgentConfig,
}

impl Evaluator {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// Run the evaluator subprocess over `submissions`, or fall back to
    /// the deterministic heuristic (§4.4) if the prompt is missing, the
    /// process fails, or the output can't be parsed.
    pub async fn evaluate_and_select(
        &self,
        phase: u8,
        submissions: &[AgentSubmission],
        context: &Value,
        output_dir: &Path,
    ) -> Selection {
        if submissions.is_empty() {
            return fallback_evaluation(submissions);
        }

        let prompt_path = Path::new(&self.config.prompts_root).join(format!("phase{phase}_evaluation.md"));
        if !prompt_path.exists() {
            return fallback_evaluation(submissions);
        }

        let mut augmented = context.clone();
        if let Value::Object(ref mut map) = augmented {
            map.insert("submissions".to_string(), json!(submissions));
        } else {
            augmented = json!({ "context": context, "submissions": submissions });
        }

        let executor = AgentExecutor::new(self.config.clone());
        let raw = match executor.launch(&prompt_path, &augmented).await {
            Ok(raw) => raw,
            Err(_) => return fallback_evaluation(submissions),
        };

        match parse_agent_output(&raw).and_then(|v| parse_evaluation_output(v, submissions)) {
            Ok(selection) => selection,
            Err(_) => fallback_evaluation(submissions),
        }
    }
}

/// Resolve `{winner, scores, reasoning, partial_adoptions}` against the
/// known submissions: the winner is the submission whose `director_type`
/// is a case-insensitive substring of the evaluator's `winner` field;
/// falling back to the first submission (with a warning) if none match.
fn parse_evaluation_output(
    value: Value,
    submissions: &[AgentSubmission],
) -> Result<Selection, crate::error::AgentError> {
    let winner_field = value
        .get("winner")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_lowercase();

    let winner_submission = submissions
        .iter()
        .find(|s| winner_field.contains(&s.director_type.to_lowercase()))
        .or_else(|| {
            warn!("evaluator winner field did not match any director_type; using first submission");
            submissions.first()
        })
        .ok_or(crate::error::AgentError::NoViableSubmissions)?;

    let scores: std::collections::BTreeMap<String, f64> = value
        .get("scores")
        .and_then(|v| v.as_object())
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
                .collect()
        })
        .unwrap_or_default();

    let partial_adoptions: Vec<PartialAdoption> = value
        .get("partial_adoptions")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|pa| {
                    Some(PartialAdoption {
                        from: pa.get("from")?.as_str()?.to_string(),
                        feature: pa.get("feature")?.as_str()?.to_string(),
                        justification: pa
                            .get("justification")
                            .and_then(|j| j.as_str())
                            .map(|s| s.to_string()),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Selection {
        winner_name: winner_submission.director_type.clone(),
        winner_output: winner_submission.output.clone(),
        scores,
        reasoning: value
            .get("reasoning")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        partial_adoptions,
    })
}

/// Deterministic fallback (§4.4): prefer the first successful submission
/// else the first submission overall; successes score 80, failures 40,
/// and the winner is boosted to 85.
fn fallback_evaluation(submissions: &[AgentSubmission]) -> Selection {
    let winner = submissions
        .iter()
        .find(|s| s.success)
        .or_else(|| submissions.first());

    let Some(winner) = winner else {
        return Selection {
            winner_name: String::new(),
            winner_output: Value::Null,
            scores: Default::default(),
            reasoning: "fallback: no submissions".to_string(),
            partial_adoptions: Vec::new(),
        };
    };

    let mut scores = std::collections::BTreeMap::new();
    for s in submissions {
        scores.insert(s.director_type.clone(), if s.success { 80.0 } else { 40.0 });
    }
    scores.insert(winner.director_type.clone(), 85.0);

    Selection {
        winner_name: winner.director_type.clone(),
        winner_output: winner.output.clone(),
        scores,
        reasoning: format!("fallback: {}", winner.director_type),
        partial_adoptions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str, success: bool) -> AgentSubmission {
        AgentSubmission {
            director_type: name.to_string(),
            success,
            output: json!({"text": name}),
            execution_time_s: 1.0,
            error: None,
        }
    }

    #[test]
    fn fallback_prefers_first_success() {
        let submissions = vec![submission("alpha", false), submission("beta", true)];
        let selection = fallback_evaluation(&submissions);
        assert_eq!(selection.winner_name, "beta");
        assert_eq!(selection.scores["beta"], 85.0);
        assert_eq!(selection.scores["alpha"], 40.0);
        assert_eq!(selection.reasoning, "fallback: beta");
    }

    #[test]
    fn fallback_uses_first_submission_if_all_fail() {
        let submissions = vec![submission("alpha", false), submission("beta", false)];
        let selection = fallback_evaluation(&submissions);
        assert_eq!(selection.winner_name, "alpha");
        assert_eq!(selection.scores["alpha"], 85.0);
    }

    #[test]
    fn fallback_is_deterministic_for_same_input() {
        let submissions = vec![submission("alpha", true), submission("beta", true)];
        let a = fallback_evaluation(&submissions);
        let b = fallback_evaluation(&submissions);
        assert_eq!(a.winner_name, b.winner_name);
        assert_eq!(a.scores, b.scores);
    }

    #[test]
    fn winner_resolution_matches_case_insensitive_substring() {
        let submissions = vec![submission("alpha", true), submission("beta", true)];
        let value = json!({"winner": "Beta (strong pacing)", "scores": {"alpha": 70, "beta": 90}, "reasoning": "beta wins"});
        let selection = parse_evaluation_output(value, &submissions).unwrap();
        assert_eq!(selection.winner_name, "beta");
        assert_eq!(selection.score(), 90.0);
    }
}
