use super::render::error_response;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::Response;

/// Pass-through token check in front of the API routes. With no token
/// configured, access is open. The token is read from the Authorization
/// header or a `token` query parameter - SSE clients cannot set headers.
pub async fn require_token(
    State(expected): State<Option<String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let provided = bearer_token(request.headers().get(header::AUTHORIZATION))
        .or_else(|| query_token(request.uri()));

    if provided.as_deref() == Some(expected.as_str()) {
        next.run(request).await
    } else {
        error_response(StatusCode::UNAUTHORIZED, "invalid or missing token")
    }
}

fn bearer_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let value = header?.to_str().ok()?;
    Some(value.strip_prefix("Bearer ").unwrap_or(value).to_owned())
}

fn query_token(uri: &Uri) -> Option<String> {
    uri.query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .map(str::to_owned)
}
