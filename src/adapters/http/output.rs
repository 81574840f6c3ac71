use super::render::error_response;
use super::AppState;
use crate::ports::encoder::FrameEncoder;
use crate::ports::projects::ProjectStore;
use crate::ports::renderer::FrameRenderer;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio_util::io::ReaderStream;

/// Stream a finished artifact out of the shared output directory.
pub async fn download<R, E, P>(
    State(state): State<AppState<R, E, P>>,
    Path(file): Path<String>,
) -> Response
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
    P: ProjectStore + 'static,
{
    if !file_name_is_safe(&file) {
        return error_response(StatusCode::BAD_REQUEST, "invalid file name");
    }

    let path = state.output_dir.join(&file);
    match tokio::fs::File::open(&path).await {
        Ok(handle) => {
            let stream = ReaderStream::new(handle);
            Response::builder()
                .header(header::CONTENT_TYPE, content_type_for(&file))
                .body(Body::from_stream(stream))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(_) => error_response(StatusCode::NOT_FOUND, "file not found"),
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

pub async fn health<R, E, P>(State(state): State<AppState<R, E, P>>) -> Json<HealthResponse>
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
    P: ProjectStore + 'static,
{
    Json(HealthResponse {
        status: "OK",
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

/// Only bare file names are served; anything that could traverse out of
/// the output directory is rejected.
fn file_name_is_safe(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
}

fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("mp4") => "video/mp4",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_names_are_safe() {
        assert!(file_name_is_safe("render_abc_123.mp4"));
        assert!(file_name_is_safe("render_abc_123.gif"));
    }

    #[test]
    fn traversal_attempts_are_rejected() {
        assert!(!file_name_is_safe("../secrets"));
        assert!(!file_name_is_safe("a/../../b.mp4"));
        assert!(!file_name_is_safe("nested/file.mp4"));
        assert!(!file_name_is_safe("windows\\file.mp4"));
        assert!(!file_name_is_safe(""));
    }

    #[test]
    fn content_types_follow_the_extension() {
        assert_eq!(content_type_for("a.mp4"), "video/mp4");
        assert_eq!(content_type_for("a.gif"), "image/gif");
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
    }
}
