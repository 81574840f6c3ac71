//! Zoetrope - Web Content to Video Renderer
//!
//! Renders arbitrary markup/style/script to MP4 or GIF by driving a
//! headless Chromium under a virtual clock and muxing the captured frame
//! sequence with FFmpeg. Every render runs as an observable, concurrently
//! executing job with live progress.
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (render requests, jobs, composition)
//! - ports/: Trait definitions at the subprocess/storage seams
//! - adapters/: Concrete implementations (Chromium, FFmpeg, registry, HTTP)
//! - application/: Generic services (pipeline orchestrator, cleanup sweeper)
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use adapters::local::registry::JobRegistry;
pub use application::orchestrator::RenderOrchestrator;
pub use config::Config;
