//! External process drivers for MV Orchestra's edit and render phases:
//! ffmpeg-based trim/merge and a Remotion-style render backend.

pub mod config;
pub mod error;
pub mod probe;
pub mod renderer;
pub mod video_editor;

pub use config::DriverConfig;
pub use error::{DriverError, DriverResult};
pub use probe::{probe_video, VideoInfo};
pub use renderer::{RenderConfig, RenderResult, Renderer};
pub use video_editor::{EditResult, MergeSpec, TransitionType, TrimSpec, VideoEditor};
