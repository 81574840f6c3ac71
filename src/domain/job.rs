use crate::domain::render::OutputFormat;
use serde::{Deserialize, Serialize};

/// Opaque job identifier (a v4 UUID string).
pub type JobId = String;

/// Lifecycle stage of a render job.
///
/// `starting -> preparing -> capturing -> encoding -> complete`, with
/// `error` reachable from any non-terminal stage. `complete` and `error`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Starting,
    Preparing,
    Capturing,
    Encoding,
    Complete,
    Error,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }
}

/// Final result, present only once a job reaches `complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    pub download_url: String,
    pub file_name: String,
    pub file_size: u64,
    pub processing_time_secs: f64,
    pub resolution: String,
    pub format: OutputFormat,
}

/// One progress event as pushed to subscribers and stored in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub stage: Stage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RenderResult>,
}

impl ProgressUpdate {
    pub fn new(percent: u8, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            percent,
            stage,
            message: message.into(),
            result: None,
        }
    }

    /// Initial state of a freshly created job record.
    pub fn starting() -> Self {
        Self::new(0, Stage::Starting, "Preparing job")
    }

    pub fn complete(result: RenderResult) -> Self {
        Self {
            percent: 100,
            stage: Stage::Complete,
            message: String::from("Render finished"),
            result: Some(result),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(0, Stage::Error, message)
    }

    /// Terminal event for subscriptions to unknown or already-reaped jobs.
    pub fn not_found() -> Self {
        Self::new(0, Stage::Error, "Job not found or expired")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_stages() {
        assert!(Stage::Complete.is_terminal());
        assert!(Stage::Error.is_terminal());
        assert!(!Stage::Starting.is_terminal());
        assert!(!Stage::Preparing.is_terminal());
        assert!(!Stage::Capturing.is_terminal());
        assert!(!Stage::Encoding.is_terminal());
    }

    #[test]
    fn stages_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Stage::Capturing).unwrap(), "\"capturing\"");
        assert_eq!(serde_json::to_string(&Stage::Error).unwrap(), "\"error\"");
    }

    #[test]
    fn result_is_omitted_while_in_flight() {
        let update = ProgressUpdate::new(42, Stage::Capturing, "Capturing frames: 45%");
        let json = serde_json::to_value(&update).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["percent"], 42);
        assert_eq!(json["stage"], "capturing");
    }

    #[test]
    fn complete_carries_the_result_at_100() {
        let update = ProgressUpdate::complete(RenderResult {
            download_url: String::from("/output/render_abc_1.mp4"),
            file_name: String::from("render_abc_1.mp4"),
            file_size: 1024,
            processing_time_secs: 3.21,
            resolution: String::from("Square (1080x1080)"),
            format: OutputFormat::Mp4,
        });
        assert_eq!(update.percent, 100);
        assert_eq!(update.stage, Stage::Complete);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["result"]["fileSize"], 1024);
        assert_eq!(json["result"]["format"], "MP4");
    }
}
