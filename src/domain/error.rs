//! Error taxonomy, one enum per failure domain.
//!
//! Validation errors are rejected synchronously, before a job exists.
//! Capture and encode errors are fatal to their job only and surface to
//! subscribers through the progress stream, never through the submit
//! response. Cleanup failures are logged where they happen and never
//! escalate, since the job is already terminal by then.

use std::time::Duration;
use thiserror::Error;

/// Request rejected before a job record is created.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("HTML markup is required")]
    MarkupEmpty,
    #[error("HTML markup exceeds the {limit} byte limit")]
    MarkupTooLarge { limit: usize },
    #[error("duration must be between 1 and {max} seconds")]
    DurationOutOfRange { max: u32 },
    #[error("fps must be between 1 and {max}")]
    FpsOutOfRange { max: u32 },
}

/// Frame capture failed. Fatal to the job.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("page load exceeded {0:?}")]
    LoadTimeout(Duration),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("browser session error: {0}")]
    Session(String),
    #[error("failed to capture frame {frame}: {message}")]
    Screenshot { frame: u32, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Encoding failed. Fatal to the job. `partial` is whatever the encoder
/// may have written before dying - removing it is the orchestrator's
/// responsibility, not the encoder's.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to spawn encoder: {0}")]
    Spawn(std::io::Error),
    #[error("encoder exited with {status}: {detail}")]
    Failed {
        status: String,
        detail: String,
        partial: std::path::PathBuf,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Any failure that moves a running pipeline to the `error` state.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("session I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Submission outcome distinct from pipeline failures: these are returned
/// synchronously and never create a job.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("job identifier collision")]
    IdCollision,
}
