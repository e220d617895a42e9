use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

pub const HEADER_NAME: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Returns the request id scoped to the current request, or a placeholder
/// when called outside request handling (e.g. from a background task).
pub fn current() -> String {
    REQUEST_ID
        .try_with(|id| id.clone())
        .unwrap_or_else(|_| "-".to_string())
}

/// Middleware layer: reads `X-Request-Id` from the incoming request or mints
/// a fresh UUID, scopes it for the remainder of the request via a tokio
/// task-local, and echoes it back on every response (success or error).
pub async fn propagate_request_id(request: Request, next: Next) -> Response {
    let incoming = request
        .headers()
        .get(HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let request_id = incoming.unwrap_or_else(|| Uuid::new_v4().to_string());
    let header_value = HeaderValue::from_str(&request_id).unwrap_or_else(|_| HeaderValue::from_static("-"));

    let mut response = REQUEST_ID
        .scope(request_id, next.run(request))
        .await;

    response.headers_mut().insert(HEADER_NAME, header_value);
    response
}
