use super::AppState;
use crate::domain::error::SubmitError;
use crate::domain::job::ProgressUpdate;
use crate::domain::render::RenderRequest;
use crate::ports::encoder::FrameEncoder;
use crate::ports::projects::ProjectStore;
use crate::ports::renderer::FrameRenderer;
use async_stream::stream;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::Stream;
use serde::Serialize;
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub job_id: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: error.into(),
        }),
    )
        .into_response()
}

/// Accept a render submission. The job id comes back immediately;
/// pipeline progress and failures are only observable on the SSE stream.
pub async fn submit<R, E, P>(
    State(state): State<AppState<R, E, P>>,
    Json(request): Json<RenderRequest>,
) -> Response
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
    P: ProjectStore + 'static,
{
    match state.orchestrator.submit(request) {
        Ok(job_id) => Json(SubmitResponse {
            success: true,
            job_id,
        })
        .into_response(),
        Err(SubmitError::Invalid(invalid)) => {
            error_response(StatusCode::BAD_REQUEST, invalid.to_string())
        }
        Err(SubmitError::IdCollision) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "please retry")
        }
    }
}

/// Live progress as Server-Sent Events: the current state first, then
/// every update until a terminal stage. Unknown ids get exactly one
/// terminal not-found event. Dropping the connection just detaches this
/// subscriber.
pub async fn progress<R, E, P>(
    State(state): State<AppState<R, E, P>>,
    Path(job_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    R: FrameRenderer + 'static,
    E: FrameEncoder + 'static,
    P: ProjectStore + 'static,
{
    let subscription = state.orchestrator.registry().subscribe(&job_id);

    let stream = stream! {
        let Some(mut subscription) = subscription else {
            if let Ok(event) = Event::default().json_data(&ProgressUpdate::not_found()) {
                yield Ok::<Event, Infallible>(event);
            }
            return;
        };

        let mut latest = subscription.snapshot.clone();
        if let Ok(event) = Event::default().json_data(&latest) {
            yield Ok(event);
        }

        while !latest.stage.is_terminal() {
            match subscription.updates.recv().await {
                Ok(update) => {
                    latest = update;
                    if let Ok(event) = Event::default().json_data(&latest) {
                        yield Ok(event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(%job_id, skipped, "subscriber lagged behind updates");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
