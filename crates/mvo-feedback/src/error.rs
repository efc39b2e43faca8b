//! Feedback-loop error types.

use thiserror::Error;

pub type FeedbackResult<T> = Result<T, FeedbackError>;

#[derive(Debug, Error)]
pub enum FeedbackError {
    /// All agents failed in an iteration; the loop aborts for that
    /// iteration and the phase remains `in_progress` for resumption.
    #[error("No viable submissions in iteration {iteration}")]
    NoViableSubmissions { iteration: u32 },

    #[error(transparent)]
    Agent(#[from] mvo_agents::AgentError),
}
