use crate::domain::error::CaptureError;
use crate::ports::ProgressSink;
use async_trait::async_trait;
use std::path::PathBuf;

/// Everything the capture driver needs to populate a session directory
/// with one still per simulated timestamp.
#[derive(Debug, Clone)]
pub struct CaptureSpec {
    /// Composed single-document page, already on disk
    pub document_path: PathBuf,
    /// Job-exclusive directory receiving the frame sequence
    pub session_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub duration_secs: u32,
    pub fps: u32,
}

impl CaptureSpec {
    pub fn total_frames(&self) -> u32 {
        self.duration_secs * self.fps
    }

    /// Simulated timestamp of frame `index` in milliseconds.
    pub fn frame_time_ms(&self, index: u32) -> f64 {
        index as f64 * 1000.0 / self.fps as f64
    }
}

/// Drives a rendering engine frame by frame. One isolated engine instance
/// per call; capture is strictly sequential within a job. On return the
/// session directory holds exactly `duration * fps` stills under the
/// frame-sequence naming contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameRenderer: Send + Sync {
    async fn capture(&self, spec: CaptureSpec, progress: ProgressSink)
        -> Result<(), CaptureError>;
}
