//! Video Editor driver (§4.7): trims and merges clips by shelling out to
//! ffmpeg.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};

/// One clip to trim to its designed duration.
#[derive(Debug, Clone)]
pub struct TrimSpec {
    pub clip_id: u32,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub start_time: f64,
    pub duration: f64,
}

/// An ordered merge of already-trimmed clips into one output.
#[derive(Debug, Clone)]
pub struct MergeSpec {
    pub clips: Vec<PathBuf>,
    pub output_path: PathBuf,
    pub transition_duration: f64,
    pub transition_type: TransitionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionType {
    None,
    Crossfade,
    Fade,
}

impl TransitionType {
    fn xfade_name(&self) -> &'static str {
        match self {
            TransitionType::Fade => "fadeblack",
            _ => "fade",
        }
    }
}

/// Outcome of a trim or merge operation (§4.7).
#[derive(Debug, Clone, Serialize)]
pub struct EditResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    pub duration_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct VideoEditor {
    config: DriverConfig,
}

impl VideoEditor {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Trim (`input_path, start_s, duration_s, output_path`) → output of
    /// the requested duration via stream copy (§4.7).
    pub async fn trim_clip(&self, spec: &TrimSpec) -> EditResult {
        debug!(clip_id = spec.clip_id, duration = spec.duration, "trimming clip");

        match self.run_trim(spec).await {
            Ok(duration_s) => EditResult {
                success: true,
                output_path: Some(spec.output_path.to_string_lossy().into_owned()),
                duration_s,
                error: None,
            },
            Err(e) => {
                error!(clip_id = spec.clip_id, error = %e, "trim failed");
                EditResult {
                    success: false,
                    output_path: None,
                    duration_s: 0.0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn run_trim(&self, spec: &TrimSpec) -> DriverResult<f64> {
        which::which(&self.config.ffmpeg_binary).map_err(|_| DriverError::FfmpegNotFound)?;

        let args = vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            format!("{:.3}", spec.start_time),
            "-i".to_string(),
            spec.input_path.to_string_lossy().into_owned(),
            "-t".to_string(),
            format!("{:.3}", spec.duration),
            "-c".to_string(),
            "copy".to_string(),
            spec.output_path.to_string_lossy().into_owned(),
        ];

        run_ffmpeg(&self.config, args).await?;

        if !spec.output_path.exists() {
            return Err(DriverError::FfmpegFailed("output file not created".to_string()));
        }

        probe_duration(&self.config, &spec.output_path).await
    }

    /// Trim multiple clips under a caller-chosen concurrency cap (§4.7).
    pub async fn trim_all(&self, specs: &[TrimSpec]) -> Vec<EditResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_trims.max(1)));
        let mut handles = Vec::with_capacity(specs.len());

        for spec in specs.iter().cloned() {
            let permit = Arc::clone(&semaphore);
            let config = self.config.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await;
                let editor = VideoEditor::new(config);
                editor.trim_clip(&spec).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap_or(EditResult {
                success: false,
                output_path: None,
                duration_s: 0.0,
                error: Some("trim task panicked".to_string()),
            }));
        }
        results
    }

    /// Merge an ordered list of clips into one output. `none` transitions
    /// (or non-positive duration) use container-level concatenation; any
    /// other transition builds a cross-fade filter-graph chain (§4.7).
    pub async fn merge_clips(&self, spec: &MergeSpec) -> EditResult {
        info!(clip_count = spec.clips.len(), "merging clips");

        let result = if spec.transition_type == TransitionType::None || spec.transition_duration <= 0.0 {
            self.concat_clips(spec).await
        } else {
            self.merge_with_transitions(spec).await
        };

        match result {
            Ok(duration_s) => EditResult {
                success: true,
                output_path: Some(spec.output_path.to_string_lossy().into_owned()),
                duration_s,
                error: None,
            },
            Err(e) => {
                error!(error = %e, "merge failed");
                EditResult {
                    success: false,
                    output_path: None,
                    duration_s: 0.0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn concat_clips(&self, spec: &MergeSpec) -> DriverResult<f64> {
        which::which(&self.config.ffmpeg_binary).map_err(|_| DriverError::FfmpegNotFound)?;

        let concat_file = spec
            .output_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!(
                "{}_concat.txt",
                spec.output_path.file_stem().and_then(|s| s.to_str()).unwrap_or("merge")
            ));

        let mut listing = String::new();
        for clip in &spec.clips {
            let absolute = clip.canonicalize().unwrap_or_else(|_| clip.clone());
            listing.push_str(&format!("file '{}'\n", absolute.display()));
        }
        std::fs::write(&concat_file, listing)?;

        let args = vec![
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            concat_file.to_string_lossy().into_owned(),
            "-c".to_string(),
            "copy".to_string(),
            spec.output_path.to_string_lossy().into_owned(),
        ];

        let result = run_ffmpeg(&self.config, args).await;
        let _ = std::fs::remove_file(&concat_file);
        result?;

        if !spec.output_path.exists() {
            return Err(DriverError::FfmpegFailed("output file not created".to_string()));
        }

        probe_duration(&self.config, &spec.output_path).await
    }

    async fn merge_with_transitions(&self, spec: &MergeSpec) -> DriverResult<f64> {
        if spec.clips.len() < 2 {
            return self.concat_clips(spec).await;
        }

        let mut durations = Vec::with_capacity(spec.clips.len());
        for clip in &spec.clips {
            let d = probe_duration(&self.config, clip).await?;
            if d <= 0.0 {
                return Err(DriverError::FfmpegFailed(format!("invalid duration for {}", clip.display())));
            }
            durations.push(d);
        }

        let filter_complex = build_transition_filter(&durations, spec.transition_duration, spec.transition_type);

        which::which(&self.config.ffmpeg_binary).map_err(|_| DriverError::FfmpegNotFound)?;

        let mut args = vec!["-y".to_string()];
        for clip in &spec.clips {
            args.push("-i".to_string());
            args.push(clip.to_string_lossy().into_owned());
        }
        args.push("-filter_complex".to_string());
        args.push(filter_complex);
        args.push(spec.output_path.to_string_lossy().into_owned());

        run_ffmpeg(&self.config, args).await?;

        if !spec.output_path.exists() {
            return Err(DriverError::FfmpegFailed("output file not created".to_string()));
        }

        probe_duration(&self.config, &spec.output_path).await
    }
}

/// Chain `xfade` filters across N clips; offset for the k-th transition
/// is the cumulative duration of prior clips minus the transition
/// duration (§4.7 `Merge`).
fn build_transition_filter(durations: &[f64], transition_dur: f64, transition_type: TransitionType) -> String {
    let xfade = transition_type.xfade_name();

    if durations.len() == 2 {
        let offset = durations[0] - transition_dur;
        return format!(
            "[0:v][1:v]xfade=transition={xfade}:duration={transition_dur}:offset={offset}[out];[out]"
        );
    }

    let mut parts = Vec::new();
    let mut offset = durations[0] - transition_dur;
    parts.push(format!(
        "[0:v][1:v]xfade=transition={xfade}:duration={transition_dur}:offset={offset}[v01]"
    ));

    for i in 2..durations.len() {
        offset += durations[i - 1] - transition_dur;
        let prev_label = format!("v0{}", i - 1);
        let curr_label = format!("v0{i}");
        parts.push(format!(
            "[{prev_label}][{i}:v]xfade=transition={xfade}:duration={transition_dur}:offset={offset}[{curr_label}]"
        ));
    }

    let last_label = format!("v0{}", durations.len() - 1);
    format!("{};[{last_label}]", parts.join(";"))
}

async fn run_ffmpeg(config: &DriverConfig, args: Vec<String>) -> DriverResult<()> {
    let mut child = Command::new(&config.ffmpeg_binary)
        .args(&args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()?;

    let output = tokio::time::timeout(config.ffmpeg_timeout, child.wait_with_output())
        .await
        .map_err(|_| DriverError::Timeout(config.ffmpeg_timeout.as_secs()))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(stderr = %stderr, "ffmpeg exited non-zero");
        return Err(DriverError::FfmpegFailed(stderr.chars().take(500).collect()));
    }

    Ok(())
}

async fn probe_duration(config: &DriverConfig, path: &Path) -> DriverResult<f64> {
    match crate::probe::probe_video(config, path).await {
        Ok(info) => Ok(info.duration),
        Err(_) => Ok(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_clip_transition_filter_uses_single_xfade() {
        let filter = build_transition_filter(&[5.0, 5.0], 1.0, TransitionType::Crossfade);
        assert_eq!(
            filter,
            "[0:v][1:v]xfade=transition=fade:duration=1:offset=4[out];[out]"
        );
    }

    #[test]
    fn multiclip_transition_chains_offsets() {
        let filter = build_transition_filter(&[5.0, 5.0, 5.0], 1.0, TransitionType::Crossfade);
        assert!(filter.contains("[v01]"));
        assert!(filter.contains("[v02]"));
        assert!(filter.ends_with(";[v02]"));
    }

    #[test]
    fn fade_transition_uses_fadeblack_xfade_type() {
        let filter = build_transition_filter(&[5.0, 5.0], 1.0, TransitionType::Fade);
        assert!(filter.contains("xfade=transition=fadeblack"));
    }
}
