//! Liveness/readiness probes. Grounded in the teacher's
//! `handlers/health.rs` liveness/readiness split, trimmed to the one
//! dependency (the database) this core actually has.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sea_orm::{ConnectionTrait, Statement};
use serde_json::json;

use crate::AppState;

/// `GET /healthz` — the process is up; no downstream checks.
pub async fn liveness() -> impl IntoResponse {
    Json(json!({ "status": "up" }))
}

/// `GET /readyz` — the process can serve traffic, i.e. the database
/// responds to a trivial round trip.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state
        .db
        .execute(Statement::from_string(
            state.db.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await
    {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready", "error": err.to_string() })),
        ),
    }
}
