//! `POST /internal/expire_once` — a synchronous trigger for the expiration
//! sweeper (spec component C4), gated by a shared secret header instead of
//! bearer auth so that an external scheduler (cron, a k8s CronJob) can
//! drive expiration without a user session.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use crate::errors::{AppError, AppResult};
use crate::sweeper;
use crate::AppState;

const SECRET_HEADER: &str = "x-internal-secret";

#[derive(Debug, Serialize)]
pub struct ExpireOnceResponse {
    pub status: &'static str,
    pub expired_count: u64,
}

/// `POST /internal/expire_once` — header `X-Internal-Secret`.
pub async fn expire_once(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<ExpireOnceResponse>> {
    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided.is_empty() || provided != state.config.internal_expire_secret {
        return Err(AppError::Unauthorized(
            "invalid internal expiration secret".to_string(),
        ));
    }

    let expired_count = sweeper::expire_once(&state.db).await?;
    if expired_count > 0 {
        state.notifier.broadcast();
    }

    Ok(Json(ExpireOnceResponse {
        status: "ok",
        expired_count,
    }))
}
