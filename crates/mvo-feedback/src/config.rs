//! Feedback-loop configuration.

/// Quality threshold and iteration cap for `run_with_feedback` (§4.5, §6).
#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    pub quality_threshold: f64,
    pub max_iterations: u32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            quality_threshold: 70.0,
            max_iterations: 3,
        }
    }
}

impl FeedbackConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            quality_threshold: std::env::var("MVO_QUALITY_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.quality_threshold),
            max_iterations: std::env::var("MVO_MAX_ITERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_iterations),
        }
    }
}
