//! Phase 6: technical quality gate (§4.9). Checks each generated clip
//! against simple technical thresholds derived from file probing; content
//! similarity scoring is out of scope, left behind a trait a real scorer
//! could implement later.

use std::path::Path;

use async_trait::async_trait;
use mvo_drivers::{probe_video, DriverConfig};
use mvo_models::ClipDesign;
use serde::Serialize;

/// Resolution/framerate/duration/codec scores, weighted into an overall
/// technical-quality score.
#[derive(Debug, Clone, Serialize)]
pub struct TechnicalQuality {
    pub resolution_score: f64,
    pub framerate_score: f64,
    pub duration_score: f64,
    pub codec_score: f64,
    pub overall_score: f64,
}

impl TechnicalQuality {
    fn weighted(resolution: f64, framerate: f64, duration: f64, codec: f64) -> Self {
        let overall = resolution * 0.3 + framerate * 0.2 + duration * 0.3 + codec * 0.2;
        Self {
            resolution_score: resolution,
            framerate_score: framerate,
            duration_score: duration,
            codec_score: codec,
            overall_score: overall,
        }
    }
}

/// One clip's quality-gate outcome.
#[derive(Debug, Clone, Serialize)]
pub struct QualityCheckResult {
    pub clip_id: u32,
    pub technical_quality: TechnicalQuality,
    pub meets_threshold: bool,
    pub issues: Vec<String>,
}

/// Seam for a technical-only quality checker; a real CLIP scorer could
/// later wrap this with a content-similarity pass (§4.9).
#[async_trait]
pub trait QualityChecker: Send + Sync {
    async fn check(&self, clip_path: &Path, design: &ClipDesign) -> QualityCheckResult;
}

/// Checks resolution (>=1280x720), framerate (>=24fps), duration (within
/// 1s of the design's), and codec (non-empty, h264/hevc/vp9) via ffprobe.
pub struct FfprobeQualityChecker {
    driver_config: DriverConfig,
    technical_threshold: f64,
}

impl FfprobeQualityChecker {
    pub fn new(driver_config: DriverConfig, technical_threshold: f64) -> Self {
        Self {
            driver_config,
            technical_threshold,
        }
    }
}

#[async_trait]
impl QualityChecker for FfprobeQualityChecker {
    async fn check(&self, clip_path: &Path, design: &ClipDesign) -> QualityCheckResult {
        let info = match probe_video(&self.driver_config, clip_path).await {
            Ok(info) => info,
            Err(e) => {
                return QualityCheckResult {
                    clip_id: design.clip_id,
                    technical_quality: TechnicalQuality::weighted(0.0, 0.0, 0.0, 0.0),
                    meets_threshold: false,
                    issues: vec![format!("probe failed: {e}")],
                };
            }
        };

        let resolution_score = if info.width >= 1280 && info.height >= 720 { 1.0 } else { 0.4 };
        let framerate_score = if info.fps >= 24.0 { 1.0 } else { 0.5 };
        let duration_score = if (info.duration - design.duration).abs() <= 1.0 { 1.0 } else { 0.3 };
        let codec_score = if matches!(info.codec.as_str(), "h264" | "hevc" | "vp9") {
            1.0
        } else if info.codec.is_empty() {
            0.0
        } else {
            0.7
        };

        let technical_quality = TechnicalQuality::weighted(resolution_score, framerate_score, duration_score, codec_score);
        let meets_threshold = technical_quality.overall_score >= self.technical_threshold;

        let mut issues = Vec::new();
        if resolution_score < 1.0 {
            issues.push(format!("resolution below 1280x720 ({}x{})", info.width, info.height));
        }
        if framerate_score < 1.0 {
            issues.push(format!("framerate below 24fps ({:.1})", info.fps));
        }
        if duration_score < 1.0 {
            issues.push(format!(
                "duration mismatch (got {:.1}s, expected {:.1}s)",
                info.duration, design.duration
            ));
        }
        if codec_score < 1.0 {
            issues.push(format!("unexpected codec: {}", info.codec));
        }
        if !meets_threshold {
            issues.push(format!(
                "technical quality below threshold ({:.2} < {:.2})",
                technical_quality.overall_score, self.technical_threshold
            ));
        }

        QualityCheckResult {
            clip_id: design.clip_id,
            technical_quality,
            meets_threshold,
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(duration: f64) -> ClipDesign {
        ClipDesign {
            clip_id: 1,
            start_time: 0.0,
            end_time: duration,
            duration,
            section: "verse".to_string(),
            prompt: "a scene".to_string(),
            strategy: None,
        }
    }

    #[test]
    fn weighted_overall_combines_components_as_specified() {
        let tq = TechnicalQuality::weighted(1.0, 1.0, 1.0, 1.0);
        assert!((tq.overall_score - 1.0).abs() < 1e-9);

        let tq = TechnicalQuality::weighted(0.4, 1.0, 1.0, 1.0);
        assert!((tq.overall_score - (0.4 * 0.3 + 0.2 + 0.3 + 0.2)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_file_fails_the_gate() {
        let checker = FfprobeQualityChecker::new(DriverConfig::default(), 0.8);
        let result = checker.check(Path::new("/nonexistent/clip.mp4"), &design(4.0)).await;
        assert!(!result.meets_threshold);
        assert!(!result.issues.is_empty());
    }
}
