//! Backend (MCP server) profiles used by the Clip Generator's Selector.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry in the backend registry (`{name: BackendProfile}`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BackendProfile {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Lower is better; ties broken ascending.
    pub priority: u32,
    #[serde(default)]
    pub cost_per_clip: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}
