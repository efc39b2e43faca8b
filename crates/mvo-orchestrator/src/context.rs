//! Builds the context handed to a design phase's agents from the results
//! of the phases before it.

use mvo_store::SessionStore;
use serde_json::{json, Value};

pub const PHASE_AUDIO_ANALYSIS: u8 = 0;
pub const PHASE_STORY_MESSAGE: u8 = 1;
pub const PHASE_SECTION_BREAKDOWN: u8 = 2;
pub const PHASE_CLIP_DESIGN: u8 = 3;
pub const PHASE_REFINEMENT: u8 = 4;
pub const PHASE_MCP_GENERATION: u8 = 5;
pub const PHASE_CLIP_EVALUATION: u8 = 6;
pub const PHASE_VIDEO_EDITING: u8 = 7;
pub const PHASE_EFFECTS_CODE: u8 = 8;
pub const PHASE_REMOTION_RENDERING: u8 = 9;

/// Build the context object for `phase_num`, chaining each prior design
/// phase's winner into the next one's input.
pub fn build_context(store: &SessionStore, phase_num: u8) -> Value {
    let mut context = json!({});
    let map = context.as_object_mut().expect("object literal above");

    if let Some(phase0_data) = store.get_phase_data(PHASE_AUDIO_ANALYSIS) {
        map.insert("audio_analysis".to_string(), phase0_data);
    }

    if phase_num == PHASE_STORY_MESSAGE {
        return context;
    }

    if phase_num >= PHASE_SECTION_BREAKDOWN {
        if let Some(winner) = winner_of(store, PHASE_STORY_MESSAGE) {
            map.insert("story".to_string(), winner);
        }
    }

    if phase_num >= PHASE_CLIP_DESIGN {
        if let Some(winner) = winner_of(store, PHASE_SECTION_BREAKDOWN) {
            map.insert("sections".to_string(), winner);
        }
    }

    if phase_num >= PHASE_REFINEMENT {
        if let Some(winner) = winner_of(store, PHASE_CLIP_DESIGN) {
            map.insert("clips".to_string(), winner);
        }
    }

    context
}

fn winner_of(store: &SessionStore, phase_num: u8) -> Option<Value> {
    store
        .get_phase_data(phase_num)
        .and_then(|data| data.get("winner").cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn phase_one_context_carries_only_audio_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::load_or_create(dir.path(), "sess").unwrap();
        store.mark_phase_started(0).unwrap();
        store.mark_phase_completed(0, json!({"bpm": 120}), true).unwrap();

        let context = build_context(&store, PHASE_STORY_MESSAGE);
        assert_eq!(context["audio_analysis"]["bpm"], 120);
        assert!(context.get("story").is_none());
    }

    #[test]
    fn phase_three_context_chains_story_and_sections() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::load_or_create(dir.path(), "sess").unwrap();
        store.mark_phase_started(0).unwrap();
        store.mark_phase_completed(0, json!({}), true).unwrap();
        store.mark_phase_started(1).unwrap();
        store
            .mark_phase_completed(1, json!({"winner": {"theme": "hope"}}), true)
            .unwrap();
        store.mark_phase_started(2).unwrap();
        store
            .mark_phase_completed(2, json!({"winner": {"sections": []}}), true)
            .unwrap();

        let context = build_context(&store, PHASE_CLIP_DESIGN);
        assert_eq!(context["story"]["theme"], "hope");
        assert_eq!(context["sections"]["sections"], json!([]));
        assert!(context.get("clips").is_none());
    }
}
