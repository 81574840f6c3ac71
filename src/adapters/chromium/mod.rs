//! Frame capture driver over a headless Chromium instance (CDP).

pub mod virtual_clock;

use crate::config::Config;
use crate::domain::error::CaptureError;
use crate::domain::render::frame_path;
use crate::ports::renderer::{CaptureSpec, FrameRenderer};
use crate::ports::ProgressSink;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use virtual_clock::{advance_expression, VIRTUAL_CLOCK_SCRIPT};

/// JPEG quality for captured stills.
const FRAME_QUALITY: i64 = 95;

/// Drives one isolated Chromium instance per capture. Frames are captured
/// strictly sequentially: the virtual clock is a single shared value in
/// the page, so parallel advances would corrupt each other.
pub struct ChromiumRenderer {
    chrome_executable: Option<PathBuf>,
    load_timeout: Duration,
    /// Absorbs residual layout thrash after fonts settle, before frame 0.
    settle_delay: Duration,
    /// Lets the compositor present each advanced state before capture.
    paint_delay: Duration,
}

impl ChromiumRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            load_timeout: config.page_load_timeout,
            settle_delay: Duration::from_millis(1000),
            paint_delay: Duration::from_millis(10),
        }
    }

    fn browser_config(&self, width: u32, height: u32) -> Result<BrowserConfig, CaptureError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(width, height)
            .viewport(Viewport {
                width,
                height,
                device_scale_factor: Some(1.0),
                ..Default::default()
            })
            .args(vec![
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--disable-accelerated-2d-canvas",
                "--font-render-hinting=none",
                "--disable-font-subpixel-positioning",
                "--no-first-run",
                "--hide-scrollbars",
            ]);
        if let Some(executable) = &self.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        builder.build().map_err(CaptureError::Launch)
    }

    async fn drive(
        &self,
        page: &Page,
        spec: &CaptureSpec,
        progress: &ProgressSink,
    ) -> Result<(), CaptureError> {
        // The clock must be in place before any content script runs.
        page.execute(
            AddScriptToEvaluateOnNewDocumentParams::builder()
                .source(VIRTUAL_CLOCK_SCRIPT)
                .build()
                .map_err(CaptureError::Session)?,
        )
        .await
        .map_err(|e| CaptureError::Session(e.to_string()))?;

        let url = format!("file://{}", spec.document_path.display());
        tokio::time::timeout(self.load_timeout, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        })
        .await
        .map_err(|_| CaptureError::LoadTimeout(self.load_timeout))?
        .map_err(|e| CaptureError::Navigation(e.to_string()))?;

        // Fonts first, then one fixed settling delay for layout.
        let fonts_ready = EvaluateParams::builder()
            .expression("document.fonts ? document.fonts.ready.then(() => true) : true")
            .await_promise(true)
            .build()
            .map_err(CaptureError::Session)?;
        page.evaluate(fonts_ready)
            .await
            .map_err(|e| CaptureError::Session(e.to_string()))?;
        tokio::time::sleep(self.settle_delay).await;

        let total = spec.total_frames();
        let cadence = report_cadence(spec.fps);
        info!(frames = total, fps = spec.fps, "starting frame capture");

        for index in 0..total {
            page.evaluate(advance_expression(spec.frame_time_ms(index)))
                .await
                .map_err(|e| CaptureError::Session(e.to_string()))?;
            tokio::time::sleep(self.paint_delay).await;

            let image = page
                .screenshot(
                    ScreenshotParams::builder()
                        .format(CaptureScreenshotFormat::Jpeg)
                        .quality(FRAME_QUALITY)
                        .full_page(false)
                        .omit_background(false)
                        .build(),
                )
                .await
                .map_err(|e| CaptureError::Screenshot {
                    frame: index,
                    message: e.to_string(),
                })?;
            tokio::fs::write(frame_path(&spec.session_dir, index), &image).await?;

            if index % cadence == 0 {
                let _ = progress.send((index * 100 / total) as u8);
            }
        }

        info!(frames = total, "frame capture finished");
        let _ = progress.send(100);
        Ok(())
    }
}

#[async_trait]
impl FrameRenderer for ChromiumRenderer {
    async fn capture(
        &self,
        spec: CaptureSpec,
        progress: ProgressSink,
    ) -> Result<(), CaptureError> {
        let (mut browser, mut handler) = Browser::launch(
            self.browser_config(spec.width, spec.height)?,
        )
        .await
        .map_err(|e| CaptureError::Launch(e.to_string()))?;

        // The handler must be polled for the CDP connection to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = match browser.new_page("about:blank").await {
            Ok(page) => self.drive(&page, &spec, &progress).await,
            Err(e) => Err(CaptureError::Session(e.to_string())),
        };

        // Teardown runs exactly once on every path; failures are logged and
        // never mask the capture result.
        if let Err(e) = browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        if let Err(e) = browser.wait().await {
            debug!(error = %e, "browser did not exit cleanly");
        }
        handler_task.abort();

        result
    }
}

/// Progress is reported every `ceil(fps / 2)` frames to bound broadcast
/// volume, plus a final 100 after the last frame.
fn report_cadence(fps: u32) -> u32 {
    ((fps + 1) / 2).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_is_half_a_second_of_frames() {
        assert_eq!(report_cadence(30), 15);
        assert_eq!(report_cadence(60), 30);
        assert_eq!(report_cadence(1), 1);
        assert_eq!(report_cadence(15), 8);
    }
}
