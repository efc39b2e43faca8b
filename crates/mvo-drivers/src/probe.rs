//! FFprobe video information, used by the video editor for transition
//! offset math and by the technical quality gate for resolution/framerate
//! checks.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};

/// Video file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: String,
    pub size: u64,
    pub bitrate: u64,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Probe `path` for duration/resolution/fps/codec.
pub async fn probe_video(config: &DriverConfig, path: &Path) -> DriverResult<VideoInfo> {
    if !path.exists() {
        return Err(DriverError::FfmpegFailed(format!("file not found: {}", path.display())));
    }

    which::which(&config.ffprobe_binary).map_err(|_| DriverError::FfmpegNotFound)?;

    let output = Command::new(&config.ffprobe_binary)
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(DriverError::FfmpegFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
    }

    let probe: FfprobeOutput =
        serde_json::from_slice(&output.stdout).map_err(|e| DriverError::FfmpegFailed(e.to_string()))?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| DriverError::FfmpegFailed("no video stream found".to_string()))?;

    let duration = probe.format.duration.as_deref().and_then(|d| d.parse().ok()).unwrap_or(0.0);
    let size = probe.format.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0);
    let bitrate = probe.format.bit_rate.as_deref().and_then(|b| b.parse().ok()).unwrap_or(0);
    let fps = video_stream
        .avg_frame_rate
        .as_deref()
        .or(video_stream.r_frame_rate.as_deref())
        .and_then(parse_frame_rate)
        .unwrap_or(30.0);

    Ok(VideoInfo {
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        fps,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
        size,
        bitrate,
    })
}

fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fractional_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
    }

    #[test]
    fn parses_decimal_frame_rate() {
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
    }
}
