//! The pipeline orchestrator: the job state machine.
//!
//! `starting -> preparing -> capturing -> encoding -> complete`, with
//! `error` reachable from any non-terminal state. Submission validates,
//! creates the registry entry and returns the job id synchronously; the
//! pipeline itself runs on a spawned task and is only observable through
//! the progress stream.

use crate::adapters::local::registry::JobRegistry;
use crate::config::Config;
use crate::domain::compose::{compose_document, DOCUMENT_FILE_NAME};
use crate::domain::error::{EncodeError, PipelineError, SubmitError};
use crate::domain::job::{JobId, ProgressUpdate, RenderResult, Stage};
use crate::domain::render::{RenderLimits, RenderRequest};
use crate::ports::encoder::{EncodeSpec, FrameEncoder};
use crate::ports::renderer::{CaptureSpec, FrameRenderer};
use crate::ports::ProgressSink;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Overall progress reached once preparation is done.
const PREPARE_PERCENT: u8 = 5;
/// Capture occupies [10, 80] of the overall range.
const CAPTURE_BASE: u8 = 10;
const CAPTURE_SPAN: u8 = 70;
/// Encoding occupies [80, 98]; 100 is reached only in `complete`.
const ENCODE_BASE: u8 = 80;
const ENCODE_SPAN: u8 = 18;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub temp_dir: PathBuf,
    pub output_dir: PathBuf,
    pub limits: RenderLimits,
    /// Delay before a finished job's session directory is deleted.
    pub session_grace: Duration,
    /// Delay before a finished job's registry entry is reaped. Longer than
    /// the session grace so a slow subscriber can still read the final
    /// result after the artifacts are gone.
    pub job_retention: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temp_dir: config.temp_dir.clone(),
            output_dir: config.output_dir.clone(),
            limits: RenderLimits {
                max_markup_bytes: config.max_markup_bytes,
                max_duration: config.max_duration,
                max_fps: config.max_fps,
            },
            session_grace: config.session_grace,
            job_retention: config.job_retention,
        }
    }
}

pub struct RenderOrchestrator<R, E> {
    registry: Arc<JobRegistry>,
    renderer: Arc<R>,
    encoder: Arc<E>,
    settings: PipelineSettings,
}

impl<R, E> RenderOrchestrator<R, E>
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
{
    pub fn new(
        registry: Arc<JobRegistry>,
        renderer: Arc<R>,
        encoder: Arc<E>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            registry,
            renderer,
            encoder,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Validate, create the job record and kick off the pipeline. Returns
    /// the job id before any rendering work begins; pipeline failures are
    /// only observable through the progress stream.
    pub fn submit(self: &Arc<Self>, request: RenderRequest) -> Result<JobId, SubmitError> {
        request.validate(&self.settings.limits)?;

        let job_id = Uuid::new_v4().to_string();
        self.registry
            .create(&job_id)
            .map_err(|_| SubmitError::IdCollision)?;

        info!(
            %job_id,
            resolution = ?request.resolution,
            format = ?request.format,
            duration = request.duration,
            fps = request.fps,
            "accepted render job"
        );

        let orchestrator = Arc::clone(self);
        let id = job_id.clone();
        tokio::spawn(async move {
            orchestrator.run_pipeline(id, request).await;
        });

        Ok(job_id)
    }

    async fn run_pipeline(&self, job_id: JobId, request: RenderRequest) {
        let started = Instant::now();
        let session_dir = self.settings.temp_dir.join(&job_id);

        match self.execute(&job_id, &request, &session_dir, started).await {
            Ok(result) => {
                info!(
                    %job_id,
                    secs = result.processing_time_secs,
                    size = result.file_size,
                    "render complete"
                );
                self.registry
                    .update(&job_id, ProgressUpdate::complete(result));

                // Artifacts outlive the job by a short grace period.
                let dir = session_dir.clone();
                let grace = self.settings.session_grace;
                tokio::spawn(async move {
                    tokio::time::sleep(grace).await;
                    if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                        warn!(dir = %dir.display(), error = %e, "session cleanup failed");
                    }
                });
            }
            Err(pipeline_error) => {
                error!(%job_id, error = %pipeline_error, "render failed");
                self.registry.update(
                    &job_id,
                    ProgressUpdate::failed(format!("Render failed: {pipeline_error}")),
                );

                // Whatever a dying encoder left behind is ours to remove.
                if let PipelineError::Encode(EncodeError::Failed { partial, .. }) =
                    &pipeline_error
                {
                    let _ = tokio::fs::remove_file(partial).await;
                }

                // A partially-written session is removed right away.
                if let Err(e) = tokio::fs::remove_dir_all(&session_dir).await {
                    debug!(dir = %session_dir.display(), error = %e, "no session to clean");
                }
            }
        }

        let registry = Arc::clone(&self.registry);
        let retention = self.settings.job_retention;
        tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            registry.remove(&job_id);
        });
    }

    async fn execute(
        &self,
        job_id: &str,
        request: &RenderRequest,
        session_dir: &Path,
        started: Instant,
    ) -> Result<RenderResult, PipelineError> {
        self.registry.update(
            job_id,
            ProgressUpdate::new(PREPARE_PERCENT, Stage::Preparing, "Preparing session files"),
        );
        tokio::fs::create_dir_all(session_dir).await?;
        let document_path = session_dir.join(DOCUMENT_FILE_NAME);
        tokio::fs::write(&document_path, compose_document(request)).await?;

        self.registry.update(
            job_id,
            ProgressUpdate::new(CAPTURE_BASE, Stage::Capturing, "Capturing frames"),
        );
        let (sink, forwarder) = self.stage_forwarder(
            job_id,
            Stage::Capturing,
            CAPTURE_BASE,
            CAPTURE_SPAN,
            "Capturing frames",
        );
        self.renderer
            .capture(
                CaptureSpec {
                    document_path,
                    session_dir: session_dir.to_path_buf(),
                    width: request.resolution.width(),
                    height: request.resolution.height(),
                    duration_secs: request.duration,
                    fps: request.fps,
                },
                sink,
            )
            .await?;
        let _ = forwarder.await;

        self.registry.update(
            job_id,
            ProgressUpdate::new(ENCODE_BASE, Stage::Encoding, "Encoding output"),
        );
        let (sink, forwarder) = self.stage_forwarder(
            job_id,
            Stage::Encoding,
            ENCODE_BASE,
            ENCODE_SPAN,
            "Encoding output",
        );
        let output_path = self
            .encoder
            .encode(
                EncodeSpec {
                    session_dir: session_dir.to_path_buf(),
                    output_dir: self.settings.output_dir.clone(),
                    format: request.format,
                    fps: request.fps,
                    width: request.resolution.width(),
                    height: request.resolution.height(),
                    duration_secs: request.duration,
                    job_id: job_id.to_owned(),
                },
                sink,
            )
            .await?;
        let _ = forwarder.await;

        let file_size = tokio::fs::metadata(&output_path).await?.len();
        let file_name = output_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(RenderResult {
            download_url: format!("/output/{file_name}"),
            file_name,
            file_size,
            processing_time_secs: round2(started.elapsed().as_secs_f64()),
            resolution: request.resolution.label().to_owned(),
            format: request.format,
        })
    }

    /// Scale a driver's raw 0-100 into this stage's slice of the overall
    /// range and broadcast it. The forwarder ends once the driver drops
    /// its sink.
    fn stage_forwarder(
        &self,
        job_id: &str,
        stage: Stage,
        base: u8,
        span: u8,
        label: &'static str,
    ) -> (ProgressSink, JoinHandle<()>) {
        let (sink, mut updates) = mpsc::unbounded_channel::<u8>();
        let registry = Arc::clone(&self.registry);
        let id = job_id.to_owned();
        let forwarder = tokio::spawn(async move {
            while let Some(percent) = updates.recv().await {
                let percent = percent.min(100);
                let overall = base + (percent as u16 * span as u16 / 100) as u8;
                registry.update(
                    &id,
                    ProgressUpdate::new(overall, stage, format!("{label}: {percent}%")),
                );
            }
        });
        (sink, forwarder)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
