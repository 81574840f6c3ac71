//! Environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Directory for per-job session directories (composed document + frames)
    pub temp_dir: PathBuf,
    /// Shared directory for finished render artifacts
    pub output_dir: PathBuf,
    /// Inclusive maximum render duration in seconds (minimum is 1)
    pub max_duration: u32,
    /// Inclusive maximum frames per second (minimum is 1)
    pub max_fps: u32,
    /// Size ceiling for submitted markup, in bytes
    pub max_markup_bytes: usize,
    /// Optional bearer token guarding the API routes
    pub auth_token: Option<String>,
    /// Chromium binary override; autodetected when unset
    pub chrome_executable: Option<PathBuf>,
    /// FFmpeg binary
    pub ffmpeg_path: String,
    /// Bound on page load + network-idle quiescence
    pub page_load_timeout: Duration,
    /// Delay before a finished job's session directory is deleted
    pub session_grace: Duration,
    /// Delay before a finished job's registry entry is reaped
    pub job_retention: Duration,
    /// Cadence of the background retention sweep
    pub cleanup_interval: Duration,
    /// Retention window for session directories under temp_dir
    pub temp_max_age: Duration,
    /// Retention window for finished artifacts under output_dir
    pub output_max_age: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("3000")),
            temp_dir: PathBuf::from(env::var("TEMP_DIR").unwrap_or_else(|_| String::from("./temp"))),
            output_dir: PathBuf::from(
                env::var("OUTPUT_DIR").unwrap_or_else(|_| String::from("./output")),
            ),
            max_duration: env_u64("MAX_DURATION", 60) as u32,
            max_fps: env_u64("MAX_FPS", 60) as u32,
            max_markup_bytes: env_u64("MAX_MARKUP_BYTES", 500_000) as usize,
            auth_token: env::var("AUTH_TOKEN").ok().filter(|t| !t.is_empty()),
            chrome_executable: env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| String::from("ffmpeg")),
            page_load_timeout: Duration::from_secs(env_u64("PAGE_LOAD_TIMEOUT_SECS", 60)),
            session_grace: Duration::from_secs(env_u64("SESSION_GRACE_SECS", 10)),
            job_retention: Duration::from_secs(env_u64("JOB_RETENTION_SECS", 120)),
            cleanup_interval: Duration::from_secs(env_u64("CLEANUP_INTERVAL_SECS", 3600)),
            temp_max_age: Duration::from_secs(env_u64("TEMP_MAX_AGE_SECS", 24 * 3600)),
            output_max_age: Duration::from_secs(env_u64("OUTPUT_MAX_AGE_SECS", 7 * 24 * 3600)),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
