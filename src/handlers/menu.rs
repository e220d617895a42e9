use axum::{extract::State, Json};
use chrono::Utc;

use crate::availability::{serialize_menu, MenuRow};
use crate::errors::AppResult;
use crate::AppState;

/// `GET /menu` — no auth required.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<MenuRow>>> {
    let rows = serialize_menu(&state.db, Utc::now()).await?;
    Ok(Json(rows))
}
