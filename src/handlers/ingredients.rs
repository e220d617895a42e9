use axum::{extract::{Path, State}, Json};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, LockType, QuerySelect, Set, TransactionTrait};
use serde::Deserialize;

use crate::auth::{require_role, AuthUser};
use crate::availability::{serialize_ingredients, IngredientRow};
use crate::db::with_retry;
use crate::entities::{ingredient, user::Role};
use crate::errors::{AppError, AppResult, ValidatedJson};
use crate::AppState;

/// `GET /ingredients` — no auth required.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<IngredientRow>>> {
    let rows = serialize_ingredients(&state.db, Utc::now()).await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct PatchIngredientRequest {
    pub on_hand_qty: Option<i32>,
    pub is_out: Option<bool>,
}

/// `PATCH /ingredients/{id}` — role=kitchen. Locks the ingredient row for
/// the duration of the update: per spec §5's shared-resource policy,
/// `on_hand_qty` is mutated by both the kitchen PATCH and reservation
/// commit, and both must acquire the row lock.
pub async fn patch_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<PatchIngredientRequest>,
) -> AppResult<Json<IngredientRow>> {
    require_role(&user, &[Role::Kitchen])?;

    if let Some(qty) = payload.on_hand_qty {
        if qty < 0 {
            return Err(AppError::Validation(
                "on_hand_qty must be >= 0".to_string(),
            ));
        }
    }

    with_retry("ingredient_patch", || async {
        let txn = state.db.begin().await?;

        let existing = ingredient::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("ingredient {id} not found")))?;

        let mut active_model: ingredient::ActiveModel = existing.into();
        if let Some(qty) = payload.on_hand_qty {
            active_model.on_hand_qty = Set(qty);
        }
        if let Some(is_out) = payload.is_out {
            active_model.is_out = Set(is_out);
        }
        active_model.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    })
    .await?;

    let rows = serialize_ingredients(&state.db, Utc::now()).await?;
    let updated = rows
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::Internal("ingredient vanished after update".to_string()))?;

    state.notifier.broadcast();
    Ok(Json(updated))
}
