//! The Selector (§4.6): capability-matching backend ("MCP server")
//! selection for each clip.

use std::collections::HashMap;

use mvo_models::{BackendProfile, ClipDesign};
use tracing::{debug, warn};

/// Requirements inferred from a clip design by simple keyword presence,
/// per §4.6's capability-matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequirements {
    pub style: String,
    pub motion_intensity: String,
    pub visual_complexity: String,
    pub aspect_ratio: String,
}

/// Holds the backend registry and picks the best match for a clip.
pub struct BackendSelector {
    servers: HashMap<String, BackendProfile>,
}

impl BackendSelector {
    pub fn new(servers: Vec<BackendProfile>) -> Self {
        Self {
            servers: servers.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }

    pub fn get_by_name(&self, name: &str) -> Option<&BackendProfile> {
        self.servers.get(name)
    }

    /// Select the best backend for `design`: a named `preferred` backend
    /// wins outright if present and available; otherwise rank available
    /// backends by capability match and ascending priority.
    pub fn select_best(&self, design: &ClipDesign, preferred: Option<&str>) -> Option<&BackendProfile> {
        if let Some(name) = preferred {
            if let Some(server) = self.servers.get(name) {
                if server.available {
                    debug!(backend = name, "using preferred backend");
                    return Some(server);
                }
            }
        }

        let requirements = Self::extract_requirements(design);
        let mut candidates: Vec<&BackendProfile> = self
            .servers
            .values()
            .filter(|s| s.available)
            .filter(|s| Self::matches_capabilities(s, &requirements))
            .collect();

        if candidates.is_empty() {
            warn!("no matching backend found, using default");
            return self
                .servers
                .get("default")
                .or_else(|| self.servers.values().min_by_key(|s| s.priority));
        }

        candidates.sort_by_key(|s| s.priority);
        candidates.into_iter().next()
    }

    /// Extract `{style, motion_intensity, visual_complexity, aspect_ratio}`
    /// from the clip's prompt/section text via keyword presence.
    fn extract_requirements(design: &ClipDesign) -> ClipRequirements {
        let desc = design.prompt.to_lowercase();

        let style = if desc.contains("anime") || desc.contains("illustration") {
            "anime"
        } else if desc.contains("abstract") || desc.contains("surreal") {
            "experimental"
        } else if desc.contains("cinematic") {
            "cinematic"
        } else {
            "realistic"
        };

        let motion_intensity = if desc.contains("static") || desc.contains("slow") {
            "low"
        } else if desc.contains("fast") || desc.contains("dynamic") {
            "high"
        } else {
            "medium"
        };

        let visual_complexity = if desc.len() > 200 || desc.contains("complex") {
            "high"
        } else if desc.len() < 100 {
            "low"
        } else {
            "medium"
        };

        ClipRequirements {
            style: style.to_string(),
            motion_intensity: motion_intensity.to_string(),
            visual_complexity: visual_complexity.to_string(),
            aspect_ratio: "16:9".to_string(),
        }
    }

    /// A server matches if the clip's style is in its capability set, or
    /// `general` is, or any motion-intensity keyword is.
    fn matches_capabilities(server: &BackendProfile, requirements: &ClipRequirements) -> bool {
        let style_match = server.capabilities.iter().any(|c| c == &requirements.style)
            || server.capabilities.iter().any(|c| c == "general");

        let motion_keywords: &[&str] = match requirements.motion_intensity.as_str() {
            "high" => &["high_motion", "dynamic", "fast"],
            "low" => &["general", "static"],
            _ => &["general"],
        };
        let motion_match = server
            .capabilities
            .iter()
            .any(|c| motion_keywords.contains(&c.as_str()));

        style_match || motion_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(name: &str, caps: &[&str], priority: u32) -> BackendProfile {
        BackendProfile {
            name: name.to_string(),
            endpoint: format!("mcp://{name}"),
            capabilities: caps.iter().map(|s| s.to_string()).collect(),
            priority,
            cost_per_clip: 1.0,
            available: true,
        }
    }

    fn design(prompt: &str) -> ClipDesign {
        ClipDesign {
            clip_id: 1,
            start_time: 0.0,
            end_time: 4.0,
            duration: 4.0,
            section: "verse".to_string(),
            prompt: prompt.to_string(),
            strategy: None,
        }
    }

    #[test]
    fn preferred_backend_wins_when_available() {
        let selector = BackendSelector::new(vec![
            server("fast", &["general"], 1),
            server("premium", &["general"], 5),
        ]);
        let chosen = selector.select_best(&design("a cinematic shot"), Some("premium")).unwrap();
        assert_eq!(chosen.name, "premium");
    }

    #[test]
    fn ranks_by_priority_ascending_on_tie() {
        let selector = BackendSelector::new(vec![
            server("b", &["general"], 2),
            server("a", &["general"], 1),
        ]);
        let chosen = selector.select_best(&design("a plain shot"), None).unwrap();
        assert_eq!(chosen.name, "a");
    }

    #[test]
    fn falls_back_to_default_on_no_match() {
        let selector = BackendSelector::new(vec![server("default", &["anime"], 1)]);
        let chosen = selector
            .select_best(&design("totally unrelated text with no keywords"), None)
            .unwrap();
        assert_eq!(chosen.name, "default");
    }

    #[test]
    fn unavailable_preferred_backend_is_skipped() {
        let mut unavailable = server("premium", &["general"], 1);
        unavailable.available = false;
        let selector = BackendSelector::new(vec![unavailable, server("fallback", &["general"], 2)]);
        let chosen = selector.select_best(&design("a shot"), Some("premium")).unwrap();
        assert_eq!(chosen.name, "fallback");
    }
}
