//! Runtime Parameter Registry admin surface (spec component C5), folded
//! into a single `/admin/reservation-ttl` envelope carrying both the TTL
//! and warning-threshold cells per SPEC_FULL §E.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{require_role, AuthUser};
use crate::entities::user::Role;
use crate::errors::{AppResult, ValidatedJson};
use crate::runtime_params::{
    TTL_MAX_SECONDS, TTL_MIN_SECONDS, WARNING_MAX_SECONDS, WARNING_MIN_SECONDS,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReservationParamsResponse {
    pub ttl_seconds: u64,
    pub min_seconds: u64,
    pub max_seconds: u64,
    pub warning_threshold_seconds: u64,
    pub warning_min_seconds: u64,
    pub warning_max_seconds: u64,
}

fn snapshot(state: &AppState) -> ReservationParamsResponse {
    ReservationParamsResponse {
        ttl_seconds: state.runtime_params.get_ttl(),
        min_seconds: TTL_MIN_SECONDS,
        max_seconds: TTL_MAX_SECONDS,
        warning_threshold_seconds: state.runtime_params.get_warning(),
        warning_min_seconds: WARNING_MIN_SECONDS,
        warning_max_seconds: WARNING_MAX_SECONDS,
    }
}

/// `GET /admin/reservation-ttl` — role ∈ {online, foh}.
pub async fn get_ttl(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<ReservationParamsResponse>> {
    require_role(&user, &[Role::Online, Role::Foh])?;
    Ok(Json(snapshot(&state)))
}

#[derive(Debug, Deserialize)]
pub struct PatchReservationParamsRequest {
    pub ttl_seconds: Option<u64>,
    pub warning_threshold_seconds: Option<u64>,
}

/// `PATCH /admin/reservation-ttl` — role=foh. Accepts either or both
/// fields; each is validated against its own bounds independently.
pub async fn patch_ttl(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<PatchReservationParamsRequest>,
) -> AppResult<Json<ReservationParamsResponse>> {
    require_role(&user, &[Role::Foh])?;

    if let Some(seconds) = payload.ttl_seconds {
        state.runtime_params.set_ttl(seconds)?;
    }
    if let Some(seconds) = payload.warning_threshold_seconds {
        state.runtime_params.set_warning(seconds)?;
    }

    Ok(Json(snapshot(&state)))
}
