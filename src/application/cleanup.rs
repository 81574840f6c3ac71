//! Periodic retention sweep over the temp and output areas.
//!
//! Jobs schedule their own session cleanup; this sweeper is the backstop
//! for anything that slipped through (crashed pipelines, old artifacts).
//! Per-entry failures are logged and skipped - cleanup never escalates.

use crate::config::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct CleanupSweeper {
    temp_dir: PathBuf,
    output_dir: PathBuf,
    temp_max_age: Duration,
    output_max_age: Duration,
    interval: Duration,
}

impl CleanupSweeper {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temp_dir: config.temp_dir.clone(),
            output_dir: config.output_dir.clone(),
            temp_max_age: config.temp_max_age,
            output_max_age: config.output_max_age,
            interval: config.cleanup_interval,
        }
    }

    #[cfg(test)]
    fn new(
        temp_dir: PathBuf,
        output_dir: PathBuf,
        temp_max_age: Duration,
        output_max_age: Duration,
    ) -> Self {
        Self {
            temp_dir,
            output_dir,
            temp_max_age,
            output_max_age,
            interval: Duration::from_secs(3600),
        }
    }

    /// Run one immediate pass, then sweep on the configured cadence.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(interval_secs = self.interval.as_secs(), "scheduling cleanup sweeps");
        tokio::spawn(async move {
            loop {
                self.sweep().await;
                tokio::time::sleep(self.interval).await;
            }
        })
    }

    pub async fn sweep(&self) {
        sweep_dir(&self.temp_dir, self.temp_max_age).await;
        sweep_dir(&self.output_dir, self.output_max_age).await;
        debug!("cleanup sweep finished");
    }
}

async fn sweep_dir(dir: &Path, max_age: Duration) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let expired = match entry.metadata().await {
            Ok(metadata) => metadata
                .modified()
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .map(|age| age > max_age)
                .unwrap_or(false),
            Err(_) => false,
        };
        if !expired {
            continue;
        }

        let removed = if path.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        match removed {
            Ok(()) => info!(path = %path.display(), "removed expired artifact"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn expired_entries_are_removed_and_fresh_ones_kept() {
        let workdir = TempDir::new().unwrap();
        let temp = workdir.path().join("temp");
        let output = workdir.path().join("output");
        std::fs::create_dir_all(temp.join("old-session")).unwrap();
        std::fs::write(temp.join("old-session").join("frame_00000.jpg"), b"x").unwrap();
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(output.join("render_old.mp4"), b"x").unwrap();

        // Zero temp retention, long output retention: the session goes,
        // the artifact stays.
        let sweeper = CleanupSweeper::new(
            temp.clone(),
            output.clone(),
            Duration::ZERO,
            Duration::from_secs(3600),
        );
        sweeper.sweep().await;

        assert!(!temp.join("old-session").exists());
        assert!(output.join("render_old.mp4").exists());
    }

    #[tokio::test]
    async fn expired_output_files_are_removed() {
        let workdir = TempDir::new().unwrap();
        let temp = workdir.path().join("temp");
        let output = workdir.path().join("output");
        std::fs::create_dir_all(&temp).unwrap();
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(output.join("render_old.gif"), b"x").unwrap();

        let sweeper = CleanupSweeper::new(
            temp,
            output.clone(),
            Duration::from_secs(3600),
            Duration::ZERO,
        );
        sweeper.sweep().await;

        assert!(!output.join("render_old.gif").exists());
    }

    #[tokio::test]
    async fn missing_directories_are_skipped_quietly() {
        let workdir = TempDir::new().unwrap();
        let sweeper = CleanupSweeper::new(
            workdir.path().join("nope"),
            workdir.path().join("also-nope"),
            Duration::ZERO,
            Duration::ZERO,
        );
        // Must not panic.
        sweeper.sweep().await;
    }
}
