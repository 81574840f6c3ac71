use super::render::{error_response, SubmitResponse};
use super::AppState;
use crate::domain::render::RenderRequest;
use crate::ports::encoder::FrameEncoder;
use crate::ports::projects::{Project, ProjectDraft, ProjectStore};
use crate::ports::renderer::FrameRenderer;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct ProjectResponse {
    pub success: bool,
    pub project: Project,
}

#[derive(Serialize)]
pub struct ProjectListResponse {
    pub success: bool,
    pub projects: Vec<Project>,
}

pub async fn list<R, E, P>(State(state): State<AppState<R, E, P>>) -> Json<ProjectListResponse>
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
    P: ProjectStore + 'static,
{
    Json(ProjectListResponse {
        success: true,
        projects: state.projects.list().await,
    })
}

pub async fn create<R, E, P>(
    State(state): State<AppState<R, E, P>>,
    Json(draft): Json<ProjectDraft>,
) -> Response
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
    P: ProjectStore + 'static,
{
    if draft.name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "project name is required");
    }
    let project = state.projects.create(draft).await;
    Json(ProjectResponse {
        success: true,
        project,
    })
    .into_response()
}

pub async fn fetch<R, E, P>(
    State(state): State<AppState<R, E, P>>,
    Path(id): Path<String>,
) -> Response
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
    P: ProjectStore + 'static,
{
    match state.projects.get(&id).await {
        Some(project) => Json(ProjectResponse {
            success: true,
            project,
        })
        .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "project not found"),
    }
}

pub async fn update<R, E, P>(
    State(state): State<AppState<R, E, P>>,
    Path(id): Path<String>,
    Json(draft): Json<ProjectDraft>,
) -> Response
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
    P: ProjectStore + 'static,
{
    if draft.name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "project name is required");
    }
    match state.projects.update(&id, draft).await {
        Some(project) => Json(ProjectResponse {
            success: true,
            project,
        })
        .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "project not found"),
    }
}

pub async fn remove<R, E, P>(
    State(state): State<AppState<R, E, P>>,
    Path(id): Path<String>,
) -> Response
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
    P: ProjectStore + 'static,
{
    if state.projects.delete(&id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, "project not found")
    }
}

/// Submit a render of a stored configuration. This is the only place the
/// pipeline consumes the project store: fetch by id, then hand the
/// configuration to the orchestrator like any other request.
pub async fn render<R, E, P>(
    State(state): State<AppState<R, E, P>>,
    Path(id): Path<String>,
) -> Response
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
    P: ProjectStore + 'static,
{
    let Some(project) = state.projects.get(&id).await else {
        return error_response(StatusCode::NOT_FOUND, "project not found");
    };

    let request = RenderRequest {
        html: project.html,
        css: project.css,
        js: project.js,
        resolution: project.resolution,
        format: project.format,
        duration: project.duration,
        fps: project.fps,
    };

    match state.orchestrator.submit(request) {
        Ok(job_id) => Json(SubmitResponse {
            success: true,
            job_id,
        })
        .into_response(),
        Err(submit_error) => error_response(StatusCode::BAD_REQUEST, submit_error.to_string()),
    }
}
