//! Agent submissions, evaluator selections, and feedback-loop bookkeeping.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One director's output for a design-phase iteration.
///
/// Produced by the Agent Executor, consumed by the Evaluator; not persisted
/// directly — it is rolled into the phase's `current_result` via
/// [`IterationRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentSubmission {
    pub director_type: String,
    pub success: bool,
    pub output: serde_json::Value,
    pub execution_time_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A directive to port a named feature from a non-winning submission into
/// the winner during downstream consumption.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PartialAdoption {
    pub from: String,
    pub feature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

/// The Evaluator's output for one iteration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Selection {
    pub winner_name: String,
    pub winner_output: serde_json::Value,
    pub scores: std::collections::BTreeMap<String, f64>,
    pub reasoning: String,
    #[serde(default)]
    pub partial_adoptions: Vec<PartialAdoption>,
}

impl Selection {
    /// `score(selection)` from §4.4: the winner's own score, or 50 if absent.
    pub fn score(&self) -> f64 {
        self.scores.get(&self.winner_name).copied().unwrap_or(50.0)
    }
}

/// The feedback record synthesized between iterations (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FeedbackRecord {
    pub previous_winner: String,
    pub previous_score: f64,
    pub evaluation_reasoning: String,
    #[serde(default)]
    pub areas_to_improve: Vec<String>,
    #[serde(default)]
    pub partial_adoptions: Vec<PartialAdoption>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// One round of the feedback loop: every submission, the selection made
/// from them, the resulting score, and the improvement over the prior
/// iteration (0 for the first iteration).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IterationRecord {
    pub iteration_num: u32,
    pub submissions: Vec<AgentSubmission>,
    pub selection: Selection,
    pub score: f64,
    pub improvement: f64,
}
