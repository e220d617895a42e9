//! S4 / testable property 6: under two concurrent create requests whose
//! combined requirements exceed available quantity of some ingredient,
//! exactly one succeeds and the other fails with `INSUFFICIENT_INGREDIENTS`.
//!
//! Grounded in the teacher's `tests/inventory_concurrency_test.rs`. That
//! harness runs against a real Postgres pool because the locking discipline
//! under test (`SELECT ... FOR UPDATE` serializing two transactions on
//! separate connections) only holds across genuinely concurrent
//! connections; an in-memory SQLite database serializes all access through
//! one connection and cannot exercise the race. Ignored by default for the
//! same reason the teacher's test is.

mod common;

use std::sync::Arc;

use kitchensync::errors::AppError;
use kitchensync::notifier::ChangeNotifier;
use kitchensync::reservation_engine;
use kitchensync::runtime_params::RuntimeParams;
use kitchensync::validation::RawReservationItem;
use migrations::{Migrator, MigratorTrait};
use sea_orm::Database;

fn item(menu_item_id: i32, qty: i32) -> RawReservationItem {
    RawReservationItem {
        menu_item_id,
        qty,
        notes: None,
    }
}

/// Run with: DATABASE_URL=postgres://... cargo test --test
/// reservation_concurrency_test -- --ignored
#[tokio::test]
#[ignore = "requires a real Postgres connection pool; SQLite cannot exercise cross-connection row locking"]
async fn two_concurrent_creates_for_one_unit_of_stock_yield_exactly_one_success() {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must point at a Postgres instance for this test");
    let db = Database::connect(database_url).await.expect("connect");
    Migrator::up(&db, None).await.expect("run migrations");

    let patty = common::seed_ingredient(&db, "Patty", 1, false).await;
    let slider = common::seed_menu_item(&db, "Slider", 499, &[(patty.id, 1)]).await;

    let notifier = Arc::new(ChangeNotifier::new());
    let params = Arc::new(RuntimeParams::new(120, 20));

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let db = db.clone();
        let notifier = notifier.clone();
        let params = params.clone();
        let items = vec![item(slider.id, 1)];
        tasks.push(tokio::spawn(async move {
            reservation_engine::create(&db, &notifier, &params, 1, &items).await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            Ok(_) => successes += 1,
            Err(AppError::InsufficientIngredients(_)) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 1, "exactly one create should succeed");
    assert_eq!(insufficient, 1, "exactly one create should be rejected as insufficient");
}
