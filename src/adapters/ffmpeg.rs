//! Encoder driver over the FFmpeg CLI.

use crate::config::Config;
use crate::domain::error::EncodeError;
use crate::domain::render::{OutputFormat, FRAME_PATTERN};
use crate::ports::encoder::{EncodeSpec, FrameEncoder};
use crate::ports::ProgressSink;
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

/// How much trailing stderr is kept for the failure message.
const STDERR_TAIL_BYTES: usize = 800;

pub struct FfmpegEncoder {
    ffmpeg_path: String,
    frame_line: Regex,
}

impl FfmpegEncoder {
    pub fn new(config: &Config) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            // -progress pipe:1 emits key=value blocks; `frame=N` counts
            // encoded frames.
            frame_line: Regex::new(r"^frame=\s*(\d+)").unwrap(),
        }
    }

    fn parse_progress_frames(&self, line: &str) -> Option<u64> {
        self.frame_line
            .captures(line.trim())
            .and_then(|captures| captures.get(1))
            .and_then(|frames| frames.as_str().parse().ok())
    }
}

#[async_trait]
impl FrameEncoder for FfmpegEncoder {
    async fn encode(
        &self,
        spec: EncodeSpec,
        progress: ProgressSink,
    ) -> Result<PathBuf, EncodeError> {
        tokio::fs::create_dir_all(&spec.output_dir).await?;
        let output_path = spec
            .output_dir
            .join(output_file_name(&spec.job_id, spec.format));

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(build_args(&spec, &output_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        info!(job_id = %spec.job_id, format = ?spec.format, "starting ffmpeg");
        let mut child = command.spawn().map_err(EncodeError::Spawn)?;

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buffer = String::new();
                let _ = stderr.read_to_string(&mut buffer).await;
                buffer
            })
        });

        // Frame-count-based percentage: the tool's own percent is
        // unreliable for still-image sequence input. Hold at 99 until the
        // process actually succeeds.
        let total = spec.total_frames() as u64;
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(frames) = self.parse_progress_frames(&line) {
                    let _ = progress.send(normalized_percent(frames, total));
                }
            }
        }

        let status = child.wait().await?;
        let detail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            warn!(job_id = %spec.job_id, %status, "ffmpeg failed");
            return Err(EncodeError::Failed {
                status: status.to_string(),
                detail: tail(&detail, STDERR_TAIL_BYTES),
                partial: output_path,
            });
        }

        info!(job_id = %spec.job_id, output = %output_path.display(), "ffmpeg finished");
        let _ = progress.send(100);
        Ok(output_path)
    }
}

/// `render_<job>_<millis>.<ext>` - unique across concurrent jobs sharing
/// one output directory.
fn output_file_name(job_id: &str, format: OutputFormat) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    format!("render_{}_{}.{}", job_id, millis, format.extension())
}

fn build_args(spec: &EncodeSpec, output_path: &Path) -> Vec<String> {
    let input_pattern = spec.session_dir.join(FRAME_PATTERN);
    let mut args: Vec<String> = vec![
        String::from("-y"),
        // The input frame rate is not inferrable from the filenames.
        String::from("-framerate"),
        spec.fps.to_string(),
        String::from("-i"),
        input_pattern.to_string_lossy().into_owned(),
    ];

    match spec.format {
        OutputFormat::Mp4 => {
            args.extend(
                [
                    "-c:v",
                    "libx264",
                    "-preset",
                    "fast",
                    "-crf",
                    "23",
                    // Broad hardware-decoder compatibility.
                    "-pix_fmt",
                    "yuv420p",
                    // Playback can start before the download finishes.
                    "-movflags",
                    "+faststart",
                    "-tune",
                    "animation",
                ]
                .map(String::from),
            );
            // Shrink to fit, then pad to even dimensions for H.264.
            args.push(String::from("-vf"));
            args.push(format!(
                "scale={}:{}:force_original_aspect_ratio=decrease,pad=ceil(iw/2)*2:ceil(ih/2)*2",
                spec.width, spec.height
            ));
        }
        OutputFormat::Gif => {
            // Two passes: palette from frame-to-frame differences, then
            // ordered dithering. Single-pass palette selection looks
            // visibly worse.
            args.push(String::from("-filter_complex"));
            args.push(format!(
                "fps={fps},scale={w}:{h}:flags=lanczos,split[s0][s1];\
                 [s0]palettegen=stats_mode=diff[p];\
                 [s1][p]paletteuse=dither=bayer:bayer_scale=5:diff_mode=rectangle",
                fps = spec.fps,
                w = spec.width,
                h = spec.height
            ));
        }
    }

    args.extend(
        ["-progress", "pipe:1", "-nostats", "-loglevel", "error"].map(String::from),
    );
    args.push(output_path.to_string_lossy().into_owned());
    args
}

fn normalized_percent(frames: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (frames * 100 / total).min(99) as u8
}

fn tail(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.trim().to_owned();
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].trim().to_owned()
}
