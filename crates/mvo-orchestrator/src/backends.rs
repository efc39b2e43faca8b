//! Loads the backend registry (`{name: BackendProfile}`) the Selector
//! chooses from, per §6's "direct serialization of the same shape, not a
//! new feature".

use std::collections::HashMap;
use std::path::Path;

use mvo_models::BackendProfile;
use tracing::warn;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Reads `path` as a JSON map of `{name: BackendProfile}` and returns the
/// profiles in name-sorted order. A missing file yields an empty
/// registry with a warning rather than an error, since a session may not
/// need Phase 5 yet.
pub fn load_backend_registry(path: &Path) -> OrchestratorResult<Vec<BackendProfile>> {
    if !path.exists() {
        warn!(path = %path.display(), "backend registry file not found; starting with an empty registry");
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(path)?;
    let map: HashMap<String, BackendProfile> = serde_json::from_str(&raw)
        .map_err(|e| OrchestratorError::BackendRegistry(format!("{}: {e}", path.display())))?;

    let mut profiles: Vec<BackendProfile> = map.into_values().collect();
    profiles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_empty_registry() {
        let registry = load_backend_registry(Path::new("/nonexistent/backends.json")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn loads_and_sorts_registry_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backends.json");
        std::fs::write(
            &path,
            r#"{
                "zeta": {"name": "zeta", "endpoint": "mcp://zeta", "capabilities": ["general"], "priority": 1, "cost_per_clip": 0.1, "available": true},
                "alpha": {"name": "alpha", "endpoint": "mcp://alpha", "capabilities": ["general"], "priority": 2, "cost_per_clip": 0.2, "available": true}
            }"#,
        )
        .unwrap();

        let registry = load_backend_registry(&path).unwrap();
        let names: Vec<&str> = registry.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
