//! Phase 0's placeholder audio analysis document.
//!
//! Real beat/BPM/section detection is an external collaborator (out of
//! scope); this crate only carries the document shape so downstream phases
//! have a stable `audio_analysis` context key.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    pub label: String,
    pub start_s: f64,
    pub end_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AudioAnalysis {
    pub audio_file: String,
    pub duration_s: f64,
    pub bpm: u32,
    #[serde(default)]
    pub beats: Vec<f64>,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub timestamp: String,
}
