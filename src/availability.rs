//! Availability Projector (spec component C2): a pure function over a
//! transactional snapshot, grounded in the original's `availability.py`
//! (`ingredient_available_qty`, `serialize_menu`). Never writes; callers
//! re-project under locks before acting on the result.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;

use crate::entities::{reservation, reservation_ingredient};
use crate::entities::{ingredient, menu_item, recipe};

/// Per-ingredient reserved quantity held by still-active, unexpired
/// reservations. Missing ingredient ids project to 0.
pub async fn active_reserved_by_ingredient<C: ConnectionTrait>(
    conn: &C,
    ingredient_ids: &[i32],
    now: DateTime<Utc>,
    exclude_reservation_id: Option<i32>,
) -> Result<HashMap<i32, i32>, sea_orm::DbErr> {
    let mut totals: HashMap<i32, i32> = ingredient_ids.iter().map(|id| (*id, 0)).collect();

    if ingredient_ids.is_empty() {
        return Ok(totals);
    }

    let mut query = reservation_ingredient::Entity::find()
        .filter(reservation_ingredient::Column::IngredientId.is_in(ingredient_ids.to_vec()))
        .inner_join(reservation::Entity)
        .filter(reservation::Column::Status.eq(crate::entities::reservation::ReservationStatus::Active.as_str()))
        .filter(reservation::Column::ExpiresAt.gt(now))
        .select_only()
        .column(reservation_ingredient::Column::IngredientId)
        .column(reservation_ingredient::Column::QtyReserved)
        .column(reservation_ingredient::Column::ReservationId);

    if let Some(exclude_id) = exclude_reservation_id {
        query = query.filter(reservation_ingredient::Column::ReservationId.ne(exclude_id));
    }

    let rows: Vec<(i32, i32, i32)> = query
        .into_tuple::<(i32, i32, i32)>()
        .all(conn)
        .await?;

    for (ingredient_id, qty_reserved, _reservation_id) in rows {
        *totals.entry(ingredient_id).or_insert(0) += qty_reserved;
    }

    Ok(totals)
}

/// `available(I) = 0 if is_out else on_hand_qty - active_reserved`.
pub fn ingredient_available_qty(on_hand_qty: i32, is_out: bool, active_reserved: i32) -> i32 {
    if is_out {
        0
    } else {
        on_hand_qty - active_reserved
    }
}

/// `low_stock(I) = available(I) <= low_stock_threshold_qty`.
pub fn ingredient_low_stock(available_qty: i32, low_stock_threshold_qty: i32) -> bool {
    available_qty <= low_stock_threshold_qty
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientRow {
    pub id: i32,
    pub name: String,
    pub on_hand_qty: i32,
    pub active_reserved_qty: i32,
    pub available_qty: i32,
    pub low_stock_threshold_qty: i32,
    pub is_out: bool,
    pub low_stock: bool,
}

/// Serializes every ingredient row with its live availability figures.
/// Grounded in the original's `serialize_ingredients`.
pub async fn serialize_ingredients<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
) -> Result<Vec<IngredientRow>, sea_orm::DbErr> {
    let ingredients = ingredient::Entity::find().all(conn).await?;
    let ids: Vec<i32> = ingredients.iter().map(|i| i.id).collect();
    let reserved = active_reserved_by_ingredient(conn, &ids, now, None).await?;

    let mut rows: Vec<IngredientRow> = ingredients
        .into_iter()
        .map(|ing| {
            let active_reserved = *reserved.get(&ing.id).unwrap_or(&0);
            let available_qty = ingredient_available_qty(ing.on_hand_qty, ing.is_out, active_reserved);
            let low_stock = ingredient_low_stock(available_qty, ing.low_stock_threshold_qty);
            IngredientRow {
                id: ing.id,
                name: ing.name,
                on_hand_qty: ing.on_hand_qty,
                active_reserved_qty: active_reserved,
                available_qty,
                low_stock_threshold_qty: ing.low_stock_threshold_qty,
                is_out: ing.is_out,
                low_stock,
            }
        })
        .collect();

    rows.sort_by_key(|r| r.id);
    Ok(rows)
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuRow {
    pub id: i32,
    pub name: String,
    pub price_cents: i32,
    pub category: Option<String>,
    pub allergens: Option<String>,
    pub available: bool,
    pub low_stock: bool,
    pub reason: Option<String>,
}

/// Serializes every menu item with its derived availability, low-stock flag
/// and failing reason, per the `(ingredient_id, recipe_id)` tie-break order.
/// Grounded in the original's `serialize_menu`.
pub async fn serialize_menu<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
) -> Result<Vec<MenuRow>, sea_orm::DbErr> {
    let menu_items = menu_item::Entity::find().all(conn).await?;
    let ingredients = ingredient::Entity::find().all(conn).await?;
    let recipes = recipe::Entity::find().all(conn).await?;

    let ingredient_by_id: HashMap<i32, &ingredient::Model> =
        ingredients.iter().map(|i| (i.id, i)).collect();

    let all_ids: Vec<i32> = ingredients.iter().map(|i| i.id).collect();
    let reserved = active_reserved_by_ingredient(conn, &all_ids, now, None).await?;

    let ingredient_available: HashMap<i32, (i32, i32)> = ingredients
        .iter()
        .map(|ing| {
            let active_reserved = *reserved.get(&ing.id).unwrap_or(&0);
            let available_qty = ingredient_available_qty(ing.on_hand_qty, ing.is_out, active_reserved);
            (ing.id, (available_qty, ing.low_stock_threshold_qty))
        })
        .collect();

    let mut recipes_by_menu_item: HashMap<i32, Vec<&recipe::Model>> = HashMap::new();
    for recipe in &recipes {
        recipes_by_menu_item
            .entry(recipe.menu_item_id)
            .or_default()
            .push(recipe);
    }
    for recipe_list in recipes_by_menu_item.values_mut() {
        recipe_list.sort_by_key(|r| (r.ingredient_id, r.id));
    }

    let mut rows: Vec<MenuRow> = menu_items
        .into_iter()
        .map(|item| {
            let empty: Vec<&recipe::Model> = Vec::new();
            let item_recipes = recipes_by_menu_item.get(&item.id).unwrap_or(&empty);

            let mut available = true;
            let mut low_stock = false;
            let mut reason = None;

            for r in item_recipes {
                let (available_qty, threshold) = ingredient_available
                    .get(&r.ingredient_id)
                    .copied()
                    .unwrap_or((0, 0));

                if ingredient_low_stock(available_qty, threshold) {
                    low_stock = true;
                }

                if available_qty < r.qty_required {
                    available = false;
                    if reason.is_none() {
                        let name = ingredient_by_id
                            .get(&r.ingredient_id)
                            .map(|i| i.name.clone())
                            .unwrap_or_default();
                        reason = Some(format!("Insufficient {name}"));
                    }
                }
            }

            MenuRow {
                id: item.id,
                name: item.name,
                price_cents: item.price_cents,
                category: item.category,
                allergens: item.allergens,
                available,
                low_stock,
                reason,
            }
        })
        .collect();

    rows.sort_by_key(|r| r.id);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_ingredient_is_always_zero_available() {
        assert_eq!(ingredient_available_qty(50, true, 0), 0);
    }

    #[test]
    fn available_subtracts_active_reserved() {
        assert_eq!(ingredient_available_qty(50, false, 12), 38);
    }

    #[test]
    fn low_stock_is_inclusive_of_threshold() {
        assert!(ingredient_low_stock(5, 5));
        assert!(!ingredient_low_stock(6, 5));
    }
}
