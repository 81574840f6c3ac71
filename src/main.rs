use std::sync::Arc;
use std::time::Instant;

use zoetrope::adapters::chromium::ChromiumRenderer;
use zoetrope::adapters::ffmpeg::FfmpegEncoder;
use zoetrope::adapters::http::{self, AppState};
use zoetrope::adapters::local::projects::InMemoryProjectStore;
use zoetrope::application::cleanup::CleanupSweeper;
use zoetrope::application::orchestrator::PipelineSettings;
use zoetrope::{Config, JobRegistry, RenderOrchestrator};

use tracing::info;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    for dir in [&config.temp_dir, &config.output_dir] {
        std::fs::create_dir_all(dir).expect("Failed to create working directory");
    }

    let registry = Arc::new(JobRegistry::new());
    let renderer = Arc::new(ChromiumRenderer::new(&config));
    let encoder = Arc::new(FfmpegEncoder::new(&config));
    let orchestrator = Arc::new(RenderOrchestrator::new(
        Arc::clone(&registry),
        renderer,
        encoder,
        PipelineSettings::from_config(&config),
    ));

    CleanupSweeper::from_config(&config).spawn();

    let state = AppState {
        orchestrator,
        projects: Arc::new(InMemoryProjectStore::new()),
        output_dir: config.output_dir.clone(),
        auth_token: config.auth_token.clone(),
        started: Instant::now(),
    };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    info!("Listening at {}:{}", config.addr, config.port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
