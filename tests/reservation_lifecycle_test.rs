//! End-to-end scenarios S1, S2, S3, S5, S6 from the spec's testable
//! properties, run against an in-memory SQLite database with the full
//! migration set applied. Grounded in the teacher's
//! `tests/inventory_concurrency_test.rs` harness pattern.

mod common;

use kitchensync::availability::{serialize_ingredients, serialize_menu};
use kitchensync::entities::reservation_ingredient;
use kitchensync::errors::AppError;
use kitchensync::notifier::ChangeNotifier;
use kitchensync::runtime_params::RuntimeParams;
use kitchensync::sweeper;
use kitchensync::validation::RawReservationItem;
use kitchensync::{reservation_engine, sweeper as sweeper_mod};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

fn item(menu_item_id: i32, qty: i32) -> RawReservationItem {
    RawReservationItem {
        menu_item_id,
        qty,
        notes: None,
    }
}

/// S1 — deterministic reason: both Tomato and Bun are out of stock; the
/// chosen reason names the lower-id ingredient.
#[tokio::test]
async fn s1_deterministic_reason_picks_lowest_ingredient_id() {
    let db = common::setup_db().await;
    let tomato = common::seed_ingredient(&db, "Tomato", 0, false).await;
    let bun = common::seed_ingredient(&db, "Bun", 0, false).await;
    assert!(tomato.id < bun.id);

    common::seed_menu_item(&db, "Deluxe", 999, &[(tomato.id, 1), (bun.id, 1)]).await;

    let rows = serialize_menu(&db, common::now()).await.unwrap();
    let deluxe = rows.iter().find(|r| r.name == "Deluxe").unwrap();

    assert!(!deluxe.available);
    assert_eq!(deluxe.reason.as_deref(), Some("Insufficient Tomato"));
}

/// S2 — successful reservation across two menu items creates the expected
/// item and ingredient holds.
#[tokio::test]
async fn s2_successful_reservation_creates_expected_holds() {
    let db = common::setup_db().await;
    let bun = common::seed_ingredient(&db, "Bun", 20, false).await;
    let patty = common::seed_ingredient(&db, "Patty", 20, false).await;
    let cheese = common::seed_ingredient(&db, "Cheese", 20, false).await;

    let basic = common::seed_menu_item(&db, "Basic", 899, &[(bun.id, 1), (patty.id, 1)]).await;
    let deluxe =
        common::seed_menu_item(&db, "Deluxe", 1199, &[(bun.id, 2), (cheese.id, 1)]).await;

    let notifier = ChangeNotifier::new();
    let params = RuntimeParams::new(120, 20);

    let items = vec![
        item(basic.id, 2),
        RawReservationItem {
            menu_item_id: deluxe.id,
            qty: 1,
            notes: Some("no onions".to_string()),
        },
    ];

    let response = reservation_engine::create(&db, &notifier, &params, 1, &items)
        .await
        .expect("reservation should succeed");
    assert_eq!(response.status, "active");

    let holds = reservation_ingredient::Entity::find()
        .filter(reservation_ingredient::Column::ReservationId.eq(response.id))
        .all(&db)
        .await
        .unwrap();

    let by_ingredient: std::collections::HashMap<i32, i32> =
        holds.iter().map(|h| (h.ingredient_id, h.qty_reserved)).collect();

    assert_eq!(holds.len(), 3);
    assert_eq!(by_ingredient[&bun.id], 4);
    assert_eq!(by_ingredient[&patty.id], 2);
    assert_eq!(by_ingredient[&cheese.id], 1);
}

/// S3 — an out-of-stock ingredient fails with the exact breakdown shape.
#[tokio::test]
async fn s3_insufficient_ingredients_reports_breakdown() {
    let db = common::setup_db().await;
    let lettuce = common::seed_ingredient(&db, "Lettuce", 10, true).await;
    let wrap = common::seed_menu_item(&db, "Wrap", 799, &[(lettuce.id, 1)]).await;

    let notifier = ChangeNotifier::new();
    let params = RuntimeParams::new(120, 20);

    let err = reservation_engine::create(&db, &notifier, &params, 1, &[item(wrap.id, 1)])
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientIngredients(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].ingredient_name, "Lettuce");
            assert_eq!(errors[0].required_qty, 1);
            assert_eq!(errors[0].available_qty, 0);
            assert!(errors[0].is_out);
            assert_eq!(errors[0].message, "Insufficient Lettuce");
        }
        other => panic!("expected InsufficientIngredients, got {other:?}"),
    }
}

/// S5 — committing twice decrements stock exactly once and is idempotent.
#[tokio::test]
async fn s5_commit_is_idempotent() {
    let db = common::setup_db().await;
    let patty = common::seed_ingredient(&db, "Patty", 10, false).await;
    let slider = common::seed_menu_item(&db, "Slider", 499, &[(patty.id, 2)]).await;

    let notifier = ChangeNotifier::new();
    let params = RuntimeParams::new(120, 20);

    let created = reservation_engine::create(&db, &notifier, &params, 1, &[item(slider.id, 1)])
        .await
        .unwrap();

    let first = reservation_engine::commit(&db, &notifier, created.id)
        .await
        .unwrap();
    assert_eq!(first.status, "committed");

    let refreshed = kitchensync::entities::ingredient::Entity::find_by_id(patty.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.on_hand_qty, 8);

    let second = reservation_engine::commit(&db, &notifier, created.id)
        .await
        .unwrap();
    assert_eq!(second.status, "committed");

    let unchanged = kitchensync::entities::ingredient::Entity::find_by_id(patty.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.on_hand_qty, 8);
}

/// S6 — sweeping an overdue active reservation restores availability.
#[tokio::test]
async fn s6_expiration_restores_capacity() {
    let db = common::setup_db().await;
    let patty = common::seed_ingredient(&db, "Patty", 1, false).await;
    let slider = common::seed_menu_item(&db, "Slider", 499, &[(patty.id, 1)]).await;

    let notifier = ChangeNotifier::new();
    let params = RuntimeParams::new(60, 20);

    let created = reservation_engine::create(&db, &notifier, &params, 1, &[item(slider.id, 1)])
        .await
        .unwrap();

    // Force the hold into the past so the sweeper picks it up.
    let reservation = kitchensync::entities::reservation::Entity::find_by_id(created.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let mut active_model: kitchensync::entities::reservation::ActiveModel = reservation.into();
    active_model.expires_at = Set(common::now() - chrono::Duration::seconds(5));
    active_model.update(&db).await.unwrap();

    let before = serialize_ingredients(&db, common::now()).await.unwrap();
    let patty_before = before.iter().find(|r| r.id == patty.id).unwrap();
    assert_eq!(patty_before.active_reserved_qty, 1);
    assert_eq!(patty_before.available_qty, 0);

    let flipped = sweeper::expire_once(&db).await.unwrap();
    assert_eq!(flipped, 1);

    let after = serialize_ingredients(&db, common::now()).await.unwrap();
    let patty_after = after.iter().find(|r| r.id == patty.id).unwrap();
    assert_eq!(patty_after.active_reserved_qty, 0);
    assert_eq!(patty_after.available_qty, 1);

    let reservation_after = kitchensync::entities::reservation::Entity::find_by_id(created.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reservation_after.status, "expired");

    let _ = sweeper_mod::expire_once(&db).await;
}

/// Terminal-state idempotence: releasing an already-released reservation
/// returns the same status without mutating anything further.
#[tokio::test]
async fn release_is_idempotent_once_terminal() {
    let db = common::setup_db().await;
    let bun = common::seed_ingredient(&db, "Bun", 5, false).await;
    let roll = common::seed_menu_item(&db, "Roll", 299, &[(bun.id, 1)]).await;

    let notifier = ChangeNotifier::new();
    let params = RuntimeParams::new(120, 20);

    let created = reservation_engine::create(&db, &notifier, &params, 1, &[item(roll.id, 1)])
        .await
        .unwrap();

    let first = reservation_engine::release(&db, &notifier, created.id)
        .await
        .unwrap();
    assert_eq!(first.status, "released");

    let second = reservation_engine::release(&db, &notifier, created.id)
        .await
        .unwrap();
    assert_eq!(second.status, "released");
}

/// Attempting to commit a released reservation is a conflict, never a
/// silent success.
#[tokio::test]
async fn commit_after_release_is_conflict() {
    let db = common::setup_db().await;
    let bun = common::seed_ingredient(&db, "Bun", 5, false).await;
    let roll = common::seed_menu_item(&db, "Roll", 299, &[(bun.id, 1)]).await;

    let notifier = ChangeNotifier::new();
    let params = RuntimeParams::new(120, 20);

    let created = reservation_engine::create(&db, &notifier, &params, 1, &[item(roll.id, 1)])
        .await
        .unwrap();
    reservation_engine::release(&db, &notifier, created.id)
        .await
        .unwrap();

    let err = reservation_engine::commit(&db, &notifier, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}
