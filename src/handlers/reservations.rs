use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::EntityTrait;
use serde::Deserialize;

use crate::auth::{require_role, AuthUser};
use crate::entities::{reservation, user::Role};
use crate::errors::{AppError, AppResult, ValidatedJson};
use crate::reservation_engine::{self, ReservationResponse};
use crate::validation::RawReservationItem;
use crate::AppState;

const RESERVATION_ROLES: [Role; 2] = [Role::Online, Role::Foh];

#[derive(Debug, Deserialize)]
pub struct ReservationItemsRequest {
    pub items: Vec<RawReservationItem>,
}

/// `POST /reservations` — role ∈ {online, foh}.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<ReservationItemsRequest>,
) -> AppResult<(StatusCode, Json<ReservationResponse>)> {
    require_role(&user, &RESERVATION_ROLES)?;
    let response = reservation_engine::create(
        &state.db,
        &state.notifier,
        &state.runtime_params,
        user.user_id,
        &payload.items,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `PATCH /reservations/{id}` — same-id re-plan (§4.3.3).
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<ReservationItemsRequest>,
) -> AppResult<Json<ReservationResponse>> {
    require_role(&user, &RESERVATION_ROLES)?;
    let response = reservation_engine::update(
        &state.db,
        &state.notifier,
        &state.runtime_params,
        id,
        &payload.items,
    )
    .await?;
    Ok(Json(response))
}

/// `GET /reservations/{id}` — supplemented operation (SPEC_FULL §E).
pub async fn get_one(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ReservationResponse>> {
    require_role(&user, &RESERVATION_ROLES)?;
    let found = reservation::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("reservation {id} not found")))?;

    Ok(Json(ReservationResponse {
        id: found.id,
        status: found.status().as_str().to_string(),
        expires_at: found.expires_at,
    }))
}

#[derive(Debug, serde::Serialize)]
pub struct CommitReleaseResponse {
    pub id: i32,
    pub status: String,
}

impl From<ReservationResponse> for CommitReleaseResponse {
    fn from(r: ReservationResponse) -> Self {
        Self {
            id: r.id,
            status: r.status,
        }
    }
}

/// `POST /reservations/{id}/commit` — §4.3.4.
pub async fn commit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<CommitReleaseResponse>> {
    require_role(&user, &RESERVATION_ROLES)?;
    let response = reservation_engine::commit(&state.db, &state.notifier, id).await?;
    Ok(Json(response.into()))
}

/// `POST /reservations/{id}/release` — §4.3.5.
pub async fn release(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<CommitReleaseResponse>> {
    require_role(&user, &RESERVATION_ROLES)?;
    let response = reservation_engine::release(&state.db, &state.notifier, id).await?;
    Ok(Json(response.into()))
}
