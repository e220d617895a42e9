//! Reservation Engine (spec component C3): create/update/commit/release,
//! each a single transaction over C1 that consults the availability
//! projector (C2) and notifies C6 on success. Grounded in the original's
//! `reservations.py` route handlers, reworked around sea-orm's
//! `TransactionTrait` and explicit `SELECT ... FOR UPDATE` locks in place of
//! SQLAlchemy's `with_for_update()`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, LockType,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::instrument;

use crate::availability::{active_reserved_by_ingredient, ingredient_available_qty};
use crate::db::with_retry;
use crate::entities::reservation::ReservationStatus;
use crate::entities::{ingredient, menu_item, recipe, reservation, reservation_ingredient, reservation_item};
use crate::errors::{AppError, AppResult, InsufficientIngredient};
use crate::notifier::ChangeNotifier;
use crate::runtime_params::RuntimeParams;
use crate::validation::{normalize_items, RawReservationItem};

#[derive(Debug, Clone, Serialize)]
pub struct ReservationResponse {
    pub id: i32,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}

/// Loads the recipes for the given menu items and returns the total
/// ingredient requirement implied by `requested_qty`, keyed by
/// `ingredient_id`. Fails `VALIDATION` if any referenced menu item id is
/// unknown.
async fn resolve_required_ingredients<C: ConnectionTrait>(
    conn: &C,
    requested_qty: &HashMap<i32, i32>,
) -> AppResult<HashMap<i32, i32>> {
    let menu_item_ids: Vec<i32> = requested_qty.keys().copied().collect();

    let found = menu_item::Entity::find()
        .filter(menu_item::Column::Id.is_in(menu_item_ids.clone()))
        .all(conn)
        .await?;
    let found_ids: HashSet<i32> = found.iter().map(|m| m.id).collect();

    let mut missing: Vec<i32> = menu_item_ids
        .iter()
        .copied()
        .filter(|id| !found_ids.contains(id))
        .collect();
    missing.sort_unstable();
    missing.dedup();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "unknown menu_item_id(s): {missing:?}"
        )));
    }

    let recipes = recipe::Entity::find()
        .filter(recipe::Column::MenuItemId.is_in(menu_item_ids))
        .all(conn)
        .await?;

    let mut required: HashMap<i32, i32> = HashMap::new();
    for r in &recipes {
        let qty = requested_qty.get(&r.menu_item_id).copied().unwrap_or(0);
        *required.entry(r.ingredient_id).or_insert(0) += r.qty_required * qty;
    }
    Ok(required)
}

/// Locks the given ingredient ids in ascending order and checks each against
/// its required quantity minus active-reserved holds. `exclude_reservation`
/// omits the named reservation's own holds from the active-reserved
/// aggregation (used by update's self-exclusion).
async fn lock_and_check_ingredients<C: ConnectionTrait>(
    conn: &C,
    required: &HashMap<i32, i32>,
    extra_ids: &[i32],
    now: DateTime<Utc>,
    exclude_reservation: Option<i32>,
) -> AppResult<Vec<InsufficientIngredient>> {
    let mut ids: HashSet<i32> = required.keys().copied().collect();
    ids.extend(extra_ids.iter().copied());
    let mut ids: Vec<i32> = ids.into_iter().collect();
    ids.sort_unstable();

    let locked_ingredients = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ids.clone()))
        .order_by_asc(ingredient::Column::Id)
        .lock(LockType::Update)
        .all(conn)
        .await?;

    let active_reserved =
        active_reserved_by_ingredient(conn, &ids, now, exclude_reservation).await?;

    let mut insufficient = Vec::new();
    for ing in &locked_ingredients {
        let req = *required.get(&ing.id).unwrap_or(&0);
        if req == 0 {
            continue;
        }
        let reserved = *active_reserved.get(&ing.id).unwrap_or(&0);
        let available = ingredient_available_qty(ing.on_hand_qty, ing.is_out, reserved);
        if available < req {
            insufficient.push(InsufficientIngredient {
                ingredient_id: ing.id,
                ingredient_name: ing.name.clone(),
                required_qty: req,
                available_qty: available,
                is_out: ing.is_out,
                message: format!("Insufficient {}", ing.name),
            });
        }
    }
    insufficient.sort_by_key(|i| i.ingredient_id);
    Ok(insufficient)
}

async fn insert_plan<C: ConnectionTrait>(
    conn: &C,
    reservation_id: i32,
    normalized: &[crate::validation::NormalizedItem],
    required: &HashMap<i32, i32>,
) -> Result<(), sea_orm::DbErr> {
    for item in normalized {
        reservation_item::ActiveModel {
            reservation_id: Set(reservation_id),
            menu_item_id: Set(item.menu_item_id),
            qty: Set(item.qty),
            notes: Set(item.notes.clone()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    for (ingredient_id, qty_reserved) in required {
        reservation_ingredient::ActiveModel {
            reservation_id: Set(reservation_id),
            ingredient_id: Set(*ingredient_id),
            qty_reserved: Set(*qty_reserved),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

/// Create: §4.3.2.
#[instrument(skip(conn, notifier, runtime_params, raw_items))]
pub async fn create(
    conn: &DatabaseConnection,
    notifier: &ChangeNotifier,
    runtime_params: &RuntimeParams,
    user_id: i32,
    raw_items: &[RawReservationItem],
) -> AppResult<ReservationResponse> {
    let normalized = normalize_items(raw_items)?;
    let now = Utc::now();
    let expires_at = now + Duration::seconds(runtime_params.get_ttl() as i64);

    let requested_qty: HashMap<i32, i32> = normalized
        .iter()
        .map(|n| (n.menu_item_id, n.qty))
        .collect();

    let reservation_id = with_retry("reservation_create", || async {
        let txn = conn.begin().await?;

        let required = resolve_required_ingredients(&txn, &requested_qty).await?;
        let insufficient = lock_and_check_ingredients(&txn, &required, &[], now, None).await?;
        if !insufficient.is_empty() {
            return Err(AppError::InsufficientIngredients(insufficient));
        }

        let reservation = reservation::ActiveModel {
            user_id: Set(user_id),
            status: Set(ReservationStatus::Active.as_str().to_string()),
            created_at: Set(now),
            expires_at: Set(expires_at),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_plan(&txn, reservation.id, &normalized, &required).await?;

        txn.commit().await?;
        Ok(reservation.id)
    })
    .await?;

    notifier.broadcast();

    Ok(ReservationResponse {
        id: reservation_id,
        status: ReservationStatus::Active.as_str().to_string(),
        expires_at,
    })
}

/// Outcome of a single update attempt: either the reservation was
/// successfully re-planned, or it turned out to be overdue and was flipped
/// to `expired` in place. Both outcomes commit a transaction and must
/// notify; only the former is a success to the caller.
enum UpdateOutcome {
    Updated(ReservationResponse),
    ExpiredNow,
}

/// Update (same-id re-plan): §4.3.3.
#[instrument(skip(conn, notifier, runtime_params, raw_items))]
pub async fn update(
    conn: &DatabaseConnection,
    notifier: &ChangeNotifier,
    runtime_params: &RuntimeParams,
    reservation_id: i32,
    raw_items: &[RawReservationItem],
) -> AppResult<ReservationResponse> {
    let normalized = normalize_items(raw_items)?;
    let now = Utc::now();
    let ttl = runtime_params.get_ttl();

    let outcome = with_retry("reservation_update", || async {
        let txn = conn.begin().await?;

        let existing = reservation::Entity::find_by_id(reservation_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id} not found")))?;

        match existing.status() {
            ReservationStatus::Active => {}
            other => {
                return Err(AppError::Conflict(format!(
                    "reservation is {}",
                    other.as_str()
                )))
            }
        }

        if existing.expires_at <= now {
            expire_in_place(&txn, &existing, now).await?;
            txn.commit().await?;
            return Ok(UpdateOutcome::ExpiredNow);
        }

        let existing_ingredient_ids: Vec<i32> = reservation_ingredient::Entity::find()
            .filter(reservation_ingredient::Column::ReservationId.eq(reservation_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|r| r.ingredient_id)
            .collect();

        let requested_qty: HashMap<i32, i32> = normalized
            .iter()
            .map(|n| (n.menu_item_id, n.qty))
            .collect();
        let required = resolve_required_ingredients(&txn, &requested_qty).await?;

        let insufficient = lock_and_check_ingredients(
            &txn,
            &required,
            &existing_ingredient_ids,
            now,
            Some(reservation_id),
        )
        .await?;
        if !insufficient.is_empty() {
            return Err(AppError::InsufficientIngredients(insufficient));
        }

        reservation_item::Entity::delete_many()
            .filter(reservation_item::Column::ReservationId.eq(reservation_id))
            .exec(&txn)
            .await?;
        reservation_ingredient::Entity::delete_many()
            .filter(reservation_ingredient::Column::ReservationId.eq(reservation_id))
            .exec(&txn)
            .await?;

        insert_plan(&txn, reservation_id, &normalized, &required).await?;

        let expires_at = now + Duration::seconds(ttl as i64);
        let mut active_model: reservation::ActiveModel = existing.into();
        active_model.expires_at = Set(expires_at);
        active_model.updated_at = Set(now);
        active_model.update(&txn).await?;

        txn.commit().await?;

        Ok(UpdateOutcome::Updated(ReservationResponse {
            id: reservation_id,
            status: ReservationStatus::Active.as_str().to_string(),
            expires_at,
        }))
    })
    .await?;

    notifier.broadcast();

    match outcome {
        UpdateOutcome::Updated(response) => Ok(response),
        UpdateOutcome::ExpiredNow => Err(AppError::Conflict("reservation has expired".to_string())),
    }
}

async fn expire_in_place<C: ConnectionTrait>(
    conn: &C,
    existing: &reservation::Model,
    now: DateTime<Utc>,
) -> Result<(), sea_orm::DbErr> {
    let mut active_model: reservation::ActiveModel = existing.clone().into();
    active_model.status = Set(ReservationStatus::Expired.as_str().to_string());
    active_model.updated_at = Set(now);
    active_model.update(conn).await?;
    Ok(())
}

/// Outcome of a single commit attempt. `AlreadyCommitted` and `Committed`
/// both report success to the caller, but only `Committed` represents a
/// state change worth notifying subscribers about.
enum CommitOutcome {
    AlreadyCommitted(ReservationResponse),
    Committed(ReservationResponse),
    ExpiredNow,
}

/// Commit: §4.3.4.
#[instrument(skip(conn, notifier))]
pub async fn commit(
    conn: &DatabaseConnection,
    notifier: &ChangeNotifier,
    reservation_id: i32,
) -> AppResult<ReservationResponse> {
    let now = Utc::now();

    let outcome = with_retry("reservation_commit", || async {
        let txn = conn.begin().await?;

        let existing = reservation::Entity::find_by_id(reservation_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id} not found")))?;

        match existing.status() {
            ReservationStatus::Committed => {
                txn.commit().await?;
                return Ok(CommitOutcome::AlreadyCommitted(ReservationResponse {
                    id: existing.id,
                    status: ReservationStatus::Committed.as_str().to_string(),
                    expires_at: existing.expires_at,
                }));
            }
            ReservationStatus::Released | ReservationStatus::Expired => {
                return Err(AppError::Conflict(format!(
                    "reservation is {}",
                    existing.status().as_str()
                )));
            }
            ReservationStatus::Active => {}
        }

        if existing.expires_at <= now {
            expire_in_place(&txn, &existing, now).await?;
            txn.commit().await?;
            return Ok(CommitOutcome::ExpiredNow);
        }

        let held = reservation_ingredient::Entity::find()
            .filter(reservation_ingredient::Column::ReservationId.eq(reservation_id))
            .all(&txn)
            .await?;

        let mut ids: Vec<i32> = held.iter().map(|h| h.ingredient_id).collect();
        ids.sort_unstable();

        let locked_ingredients = ingredient::Entity::find()
            .filter(ingredient::Column::Id.is_in(ids))
            .order_by_asc(ingredient::Column::Id)
            .lock(LockType::Update)
            .all(&txn)
            .await?;
        let by_id: HashMap<i32, &ingredient::Model> =
            locked_ingredients.iter().map(|i| (i.id, i)).collect();

        for h in &held {
            let ing = by_id.get(&h.ingredient_id).ok_or_else(|| {
                AppError::Internal(format!(
                    "reservation_ingredient references missing ingredient {}",
                    h.ingredient_id
                ))
            })?;
            let next = ing.on_hand_qty - h.qty_reserved;
            if next < 0 {
                return Err(AppError::Internal(format!(
                    "invariant breach: on_hand_qty for ingredient {} would go negative on commit",
                    ing.id
                )));
            }
            let mut active_model: ingredient::ActiveModel = (*ing).clone().into();
            active_model.on_hand_qty = Set(next);
            active_model.update(&txn).await?;
        }

        let mut active_model: reservation::ActiveModel = existing.clone().into();
        active_model.status = Set(ReservationStatus::Committed.as_str().to_string());
        active_model.updated_at = Set(now);
        active_model.update(&txn).await?;

        txn.commit().await?;

        Ok(CommitOutcome::Committed(ReservationResponse {
            id: existing.id,
            status: ReservationStatus::Committed.as_str().to_string(),
            expires_at: existing.expires_at,
        }))
    })
    .await?;

    match outcome {
        CommitOutcome::AlreadyCommitted(response) => Ok(response),
        CommitOutcome::Committed(response) => {
            notifier.broadcast();
            Ok(response)
        }
        CommitOutcome::ExpiredNow => {
            notifier.broadcast();
            Err(AppError::Conflict("reservation has expired".to_string()))
        }
    }
}

/// Release: §4.3.5. `was_already_terminal` distinguishes the idempotent
/// no-op path (already `released`/`expired`; nothing to notify) from an
/// actual state transition.
struct ReleaseOutcome {
    response: ReservationResponse,
    was_already_terminal: bool,
}

#[instrument(skip(conn, notifier))]
pub async fn release(
    conn: &DatabaseConnection,
    notifier: &ChangeNotifier,
    reservation_id: i32,
) -> AppResult<ReservationResponse> {
    let now = Utc::now();

    let outcome = with_retry("reservation_release", || async {
        let txn = conn.begin().await?;

        let existing = reservation::Entity::find_by_id(reservation_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id} not found")))?;

        let outcome = match existing.status() {
            ReservationStatus::Committed => {
                return Err(AppError::Conflict("reservation is committed".to_string()))
            }
            ReservationStatus::Released | ReservationStatus::Expired => ReleaseOutcome {
                response: ReservationResponse {
                    id: existing.id,
                    status: existing.status().as_str().to_string(),
                    expires_at: existing.expires_at,
                },
                was_already_terminal: true,
            },
            ReservationStatus::Active => {
                let new_status = if existing.expires_at <= now {
                    ReservationStatus::Expired
                } else {
                    ReservationStatus::Released
                };
                let mut active_model: reservation::ActiveModel = existing.clone().into();
                active_model.status = Set(new_status.as_str().to_string());
                active_model.updated_at = Set(now);
                active_model.update(&txn).await?;
                ReleaseOutcome {
                    response: ReservationResponse {
                        id: existing.id,
                        status: new_status.as_str().to_string(),
                        expires_at: existing.expires_at,
                    },
                    was_already_terminal: false,
                }
            }
        };

        txn.commit().await?;
        Ok(outcome)
    })
    .await?;

    if !outcome.was_already_terminal {
        notifier.broadcast();
    }
    Ok(outcome.response)
}
