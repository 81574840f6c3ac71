use crate::domain::error::EncodeError;
use crate::domain::render::OutputFormat;
use crate::ports::ProgressSink;
use async_trait::async_trait;
use std::path::PathBuf;

/// Input to the encode stage: a populated session directory plus the
/// parameters the encoder cannot infer from the frames alone.
#[derive(Debug, Clone)]
pub struct EncodeSpec {
    pub session_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub duration_secs: u32,
    pub job_id: String,
}

impl EncodeSpec {
    pub fn total_frames(&self) -> u32 {
        self.duration_secs * self.fps
    }
}

/// Muxes an ordered frame sequence into the requested container and
/// returns the path of the finished artifact. The output file name embeds
/// the job id and a timestamp so concurrent jobs sharing the output
/// directory never collide.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameEncoder: Send + Sync {
    async fn encode(&self, spec: EncodeSpec, progress: ProgressSink)
        -> Result<PathBuf, EncodeError>;
}
