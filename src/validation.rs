//! Request Validators / Serializers (spec component C7): payload shape
//! checks and the normalize-items step shared by create/update (§4.3.1).

use serde::Deserialize;

use crate::errors::AppError;

/// Raw, unvalidated line item as received over the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReservationItem {
    pub menu_item_id: i32,
    pub qty: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A normalized, merged, sorted line item ready for the reservation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedItem {
    pub menu_item_id: i32,
    pub qty: i32,
    pub notes: Option<String>,
}

/// Merges duplicate `menu_item_id` entries by summing `qty` (last non-null
/// `notes` wins) and sorts the result ascending by `menu_item_id`.
///
/// Fails `VALIDATION` if the list is empty or any entry has `qty < 1`.
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize_items(items: &[RawReservationItem]) -> Result<Vec<NormalizedItem>, AppError> {
    if items.is_empty() {
        return Err(AppError::Validation(
            "items must be a non-empty list".to_string(),
        ));
    }

    for item in items {
        if item.qty < 1 {
            return Err(AppError::Validation(format!(
                "qty must be >= 1 for menu_item_id {}",
                item.menu_item_id
            )));
        }
    }

    let mut merged: Vec<NormalizedItem> = Vec::new();
    for item in items {
        if let Some(existing) = merged
            .iter_mut()
            .find(|m| m.menu_item_id == item.menu_item_id)
        {
            existing.qty += item.qty;
            if let Some(notes) = &item.notes {
                existing.notes = Some(notes.clone());
            }
        } else {
            merged.push(NormalizedItem {
                menu_item_id: item.menu_item_id,
                qty: item.qty,
                notes: item.notes.clone(),
            });
        }
    }

    merged.sort_by_key(|m| m.menu_item_id);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(menu_item_id: i32, qty: i32, notes: Option<&str>) -> RawReservationItem {
        RawReservationItem {
            menu_item_id,
            qty,
            notes: notes.map(|s| s.to_string()),
        }
    }

    #[test]
    fn rejects_empty_list() {
        assert!(normalize_items(&[]).is_err());
    }

    #[test]
    fn rejects_non_positive_qty() {
        assert!(normalize_items(&[raw(1, 0, None)]).is_err());
        assert!(normalize_items(&[raw(1, -1, None)]).is_err());
    }

    #[test]
    fn merges_duplicates_by_summing_qty() {
        let items = vec![raw(2, 1, None), raw(1, 3, None), raw(2, 4, None)];
        let normalized = normalize_items(&items).unwrap();
        assert_eq!(
            normalized,
            vec![
                NormalizedItem {
                    menu_item_id: 1,
                    qty: 3,
                    notes: None
                },
                NormalizedItem {
                    menu_item_id: 2,
                    qty: 5,
                    notes: None
                },
            ]
        );
    }

    #[test]
    fn last_non_null_notes_wins() {
        let items = vec![
            raw(1, 1, Some("first")),
            raw(1, 1, None),
            raw(1, 1, Some("last")),
        ];
        let normalized = normalize_items(&items).unwrap();
        assert_eq!(normalized[0].notes.as_deref(), Some("last"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let items = vec![raw(2, 1, Some("x")), raw(1, 3, None)];
        let once = normalize_items(&items).unwrap();
        let raw_again: Vec<RawReservationItem> = once
            .iter()
            .map(|n| raw(n.menu_item_id, n.qty, n.notes.as_deref()))
            .collect();
        let twice = normalize_items(&raw_again).unwrap();
        assert_eq!(once, twice);
    }
}
