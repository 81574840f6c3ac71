use crate::domain::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Target resolution. A closed set: the pipeline only renders at these
/// fixed viewport sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "HD_Vertical")]
    HdVertical,
    Square,
    #[serde(rename = "HD_Horizontal")]
    HdHorizontal,
}

impl Resolution {
    pub fn width(&self) -> u32 {
        match self {
            Resolution::HdVertical => 1080,
            Resolution::Square => 1080,
            Resolution::HdHorizontal => 1920,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Resolution::HdVertical => 1920,
            Resolution::Square => 1080,
            Resolution::HdHorizontal => 1080,
        }
    }

    /// Display label carried into the final render result.
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::HdVertical => "Reels/TikTok (1080x1920)",
            Resolution::Square => "Square (1080x1080)",
            Resolution::HdHorizontal => "Landscape (1920x1080)",
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::HdVertical
    }
}

/// Output container. Also a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[serde(rename = "MP4")]
    Mp4,
    #[serde(rename = "GIF")]
    Gif,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Gif => "gif",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Mp4
    }
}

/// A render submission. Unknown resolution/format keys are rejected at
/// deserialization; range and size invariants are checked by [`RenderRequest::validate`].
#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub js: String,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_duration() -> u32 {
    15
}

fn default_fps() -> u32 {
    30
}

/// Bounds a request must satisfy before a job is created.
#[derive(Debug, Clone, Copy)]
pub struct RenderLimits {
    pub max_markup_bytes: usize,
    pub max_duration: u32,
    pub max_fps: u32,
}

impl RenderRequest {
    /// Check every submission invariant. A violation fails the request
    /// before any job record or filesystem state exists.
    pub fn validate(&self, limits: &RenderLimits) -> Result<(), ValidationError> {
        if self.html.is_empty() {
            return Err(ValidationError::MarkupEmpty);
        }
        if self.html.len() > limits.max_markup_bytes {
            return Err(ValidationError::MarkupTooLarge {
                limit: limits.max_markup_bytes,
            });
        }
        if self.duration < 1 || self.duration > limits.max_duration {
            return Err(ValidationError::DurationOutOfRange {
                max: limits.max_duration,
            });
        }
        if self.fps < 1 || self.fps > limits.max_fps {
            return Err(ValidationError::FpsOutOfRange { max: limits.max_fps });
        }
        Ok(())
    }

    pub fn total_frames(&self) -> u32 {
        self.duration * self.fps
    }
}

/// FFmpeg-style input pattern matching [`frame_file_name`].
pub const FRAME_PATTERN: &str = "frame_%05d.jpg";

/// Fixed-width frame naming so lexicographic and numeric order coincide.
/// The encoder depends on this exact contract.
pub fn frame_file_name(index: u32) -> String {
    format!("frame_{:05}.jpg", index)
}

pub fn frame_path(session_dir: &Path, index: u32) -> PathBuf {
    session_dir.join(frame_file_name(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> RenderLimits {
        RenderLimits {
            max_markup_bytes: 500_000,
            max_duration: 60,
            max_fps: 60,
        }
    }

    fn valid_request() -> RenderRequest {
        RenderRequest {
            html: String::from("<div class=\"card\">hello</div>"),
            css: String::new(),
            js: String::new(),
            resolution: Resolution::HdVertical,
            format: OutputFormat::Mp4,
            duration: 15,
            fps: 30,
        }
    }

    #[test]
    fn accepts_a_valid_request() {
        assert!(valid_request().validate(&limits()).is_ok());
    }

    #[test]
    fn rejects_empty_markup() {
        let mut request = valid_request();
        request.html = String::new();
        assert!(matches!(
            request.validate(&limits()),
            Err(ValidationError::MarkupEmpty)
        ));
    }

    #[test]
    fn rejects_oversized_markup() {
        let mut request = valid_request();
        request.html = "x".repeat(500_001);
        assert!(matches!(
            request.validate(&limits()),
            Err(ValidationError::MarkupTooLarge { .. })
        ));
    }

    #[test]
    fn rejects_duration_outside_bounds() {
        let mut request = valid_request();
        request.duration = 0;
        assert!(request.validate(&limits()).is_err());
        request.duration = 61;
        assert!(request.validate(&limits()).is_err());
        request.duration = 60;
        assert!(request.validate(&limits()).is_ok());
    }

    #[test]
    fn rejects_fps_outside_bounds() {
        let mut request = valid_request();
        request.fps = 0;
        assert!(request.validate(&limits()).is_err());
        request.fps = 61;
        assert!(request.validate(&limits()).is_err());
        request.fps = 1;
        assert!(request.validate(&limits()).is_ok());
    }

    #[test]
    fn frame_names_sort_in_capture_order() {
        let mut names: Vec<String> = (0..120).map(frame_file_name).collect();
        let numeric = names.clone();
        names.sort();
        assert_eq!(names, numeric);
        assert_eq!(frame_file_name(0), "frame_00000.jpg");
        assert_eq!(frame_file_name(19), "frame_00019.jpg");
    }

    #[test]
    fn total_frames_is_duration_times_fps() {
        let mut request = valid_request();
        request.duration = 2;
        request.fps = 10;
        assert_eq!(request.total_frames(), 20);
    }

    #[test]
    fn wire_names_match_the_public_api() {
        let request: RenderRequest = serde_json::from_str(
            r#"{"html":"<b>x</b>","resolution":"HD_Horizontal","format":"GIF"}"#,
        )
        .unwrap();
        assert_eq!(request.resolution, Resolution::HdHorizontal);
        assert_eq!(request.format, OutputFormat::Gif);
        assert_eq!(request.duration, 15);
        assert_eq!(request.fps, 30);
    }

    #[test]
    fn unknown_resolution_is_rejected() {
        let result: Result<RenderRequest, _> =
            serde_json::from_str(r#"{"html":"<b>x</b>","resolution":"8K"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn resolution_dimensions() {
        assert_eq!(
            (Resolution::HdVertical.width(), Resolution::HdVertical.height()),
            (1080, 1920)
        );
        assert_eq!(
            (Resolution::Square.width(), Resolution::Square.height()),
            (1080, 1080)
        );
        assert_eq!(
            (
                Resolution::HdHorizontal.width(),
                Resolution::HdHorizontal.height()
            ),
            (1920, 1080)
        );
    }
}
