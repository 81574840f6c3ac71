//! HTTP surface: job submission, live progress (SSE), project CRUD,
//! artifact downloads and health.

pub mod auth;
pub mod output;
pub mod projects;
pub mod render;

use crate::application::orchestrator::RenderOrchestrator;
use crate::ports::encoder::FrameEncoder;
use crate::ports::projects::ProjectStore;
use crate::ports::renderer::FrameRenderer;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

pub struct AppState<R, E, P> {
    pub orchestrator: Arc<RenderOrchestrator<R, E>>,
    pub projects: Arc<P>,
    pub output_dir: PathBuf,
    pub auth_token: Option<String>,
    pub started: Instant,
}

// Derived Clone would require R/E/P: Clone; every field is shared.
impl<R, E, P> Clone for AppState<R, E, P> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            projects: Arc::clone(&self.projects),
            output_dir: self.output_dir.clone(),
            auth_token: self.auth_token.clone(),
            started: self.started,
        }
    }
}

pub fn router<R, E, P>(state: AppState<R, E, P>) -> Router
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
    P: ProjectStore + 'static,
{
    // The optional token guards the API; artifact downloads and health
    // stay public, as does the original service's layout.
    let api = Router::new()
        .route("/render", post(render::submit::<R, E, P>))
        .route("/render/progress/:job_id", get(render::progress::<R, E, P>))
        .route(
            "/projects",
            get(projects::list::<R, E, P>).post(projects::create::<R, E, P>),
        )
        .route(
            "/projects/:id",
            get(projects::fetch::<R, E, P>)
                .put(projects::update::<R, E, P>)
                .delete(projects::remove::<R, E, P>),
        )
        .route("/projects/:id/render", post(projects::render::<R, E, P>))
        .layer(middleware::from_fn_with_state(
            state.auth_token.clone(),
            auth::require_token,
        ));

    Router::new()
        .nest("/api", api)
        .route("/output/:file", get(output::download::<R, E, P>))
        .route("/health", get(output::health::<R, E, P>))
        .with_state(state)
}
