//! Clip designs (Phase 3/4 winners) and clip generation results (Phase 5).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What to fall back to if the primary backend fails a clip.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FallbackStrategy {
    pub alternative_mcp: String,
}

/// Per-clip generation strategy, carried alongside the design so the
/// generator can honor a preferred backend and fallback chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GenerationStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_mcp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_strategy: Option<FallbackStrategy>,
}

/// A single clip's design, produced by the P3/P4 winner and consumed by the
/// Clip Generator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClipDesign {
    pub clip_id: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub section: String,
    pub prompt: String,
    #[serde(default)]
    pub strategy: Option<GenerationStrategy>,
}

/// Outcome of generating one clip, stored under phase 5's result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClipResult {
    pub clip_id: u32,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    pub backend_name: String,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
