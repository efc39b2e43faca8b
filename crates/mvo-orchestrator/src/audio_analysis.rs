//! Phase 0: audio analysis placeholder (§4.8). Real beat/BPM/section
//! detection is an external collaborator; this just validates the input
//! file exists and produces the stable `AudioAnalysis` document shape so
//! Phase 1 onward have an `audio_analysis` context key.

use std::path::Path;

use mvo_models::AudioAnalysis;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Placeholder duration/bpm used when real signal analysis isn't available.
const PLACEHOLDER_DURATION_S: f64 = 180.0;
const PLACEHOLDER_BPM: u32 = 120;

pub fn analyze_audio(audio_file: &Path) -> OrchestratorResult<AudioAnalysis> {
    if !audio_file.exists() {
        return Err(OrchestratorError::AudioFileNotFound(
            audio_file.to_string_lossy().into_owned(),
        ));
    }

    Ok(AudioAnalysis {
        audio_file: audio_file.to_string_lossy().into_owned(),
        duration_s: PLACEHOLDER_DURATION_S,
        bpm: PLACEHOLDER_BPM,
        beats: Vec::new(),
        sections: Vec::new(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_audio_file_is_rejected() {
        let err = analyze_audio(Path::new("/nonexistent/song.mp3")).unwrap_err();
        assert!(matches!(err, OrchestratorError::AudioFileNotFound(_)));
    }

    #[test]
    fn existing_file_produces_placeholder_document() {
        let dir = tempfile::tempdir().unwrap();
        let audio_path = dir.path().join("song.mp3");
        std::fs::write(&audio_path, b"fake audio bytes").unwrap();

        let analysis = analyze_audio(&audio_path).unwrap();
        assert_eq!(analysis.duration_s, PLACEHOLDER_DURATION_S);
        assert_eq!(analysis.bpm, PLACEHOLDER_BPM);
        assert!(analysis.beats.is_empty());
        assert!(analysis.sections.is_empty());
        assert!(!analysis.timestamp.is_empty());
    }
}
