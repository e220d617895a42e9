use std::sync::Arc;

use chrono::Utc;
use kitchensync::config::AppConfig;
use kitchensync::entities::{ingredient, menu_item, recipe, user::Role};
use kitchensync::notifier::ChangeNotifier;
use kitchensync::runtime_params::RuntimeParams;
use kitchensync::AppState;
use migrations::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub const TEST_JWT_SECRET: &str = "test-secret-at-least-32-bytes-long-for-hs256";

/// Spins up a fresh in-memory SQLite database with the full migration set
/// applied. Mirrors the teacher's `sqlite::memory:` harness used by
/// `inventory_concurrency_test.rs`.
pub async fn setup_db() -> DatabaseConnection {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn seed_ingredient(db: &DatabaseConnection, name: &str, on_hand: i32, is_out: bool) -> ingredient::Model {
    ingredient::ActiveModel {
        name: Set(name.to_string()),
        on_hand_qty: Set(on_hand),
        low_stock_threshold_qty: Set(0),
        is_out: Set(is_out),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert ingredient")
}

pub async fn seed_menu_item(
    db: &DatabaseConnection,
    name: &str,
    price_cents: i32,
    recipe_rows: &[(i32, i32)],
) -> menu_item::Model {
    let item = menu_item::ActiveModel {
        name: Set(name.to_string()),
        price_cents: Set(price_cents),
        category: Set(None),
        allergens: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert menu item");

    for (ingredient_id, qty_required) in recipe_rows {
        recipe::ActiveModel {
            menu_item_id: Set(item.id),
            ingredient_id: Set(*ingredient_id),
            qty_required: Set(*qty_required),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("insert recipe");
    }

    item
}

pub fn now() -> chrono::DateTime<Utc> {
    Utc::now()
}

/// Builds an `AppState` suitable for exercising the full axum router
/// (`kitchensync::handlers::build_router`) against an in-memory database,
/// mirroring the teacher's `TestApp` harness in `tests/common/mod.rs`.
pub fn test_app_state(db: DatabaseConnection) -> AppState {
    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "error".to_string(),
        log_json: false,
        jwt_secret_key: TEST_JWT_SECRET.to_string(),
        jwt_algorithm: "HS256".to_string(),
        jwt_access_token_ttl_minutes: 60,
        reservation_ttl_seconds: 120,
        reservation_warning_threshold_seconds: 20,
        expiration_interval_seconds: 30,
        enable_inprocess_expiration_job: false,
        internal_expire_secret: "test-internal-secret".to_string(),
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_acquire_timeout_secs: 5,
    };

    AppState {
        db,
        config: Arc::new(config),
        runtime_params: Arc::new(RuntimeParams::new(120, 20)),
        notifier: Arc::new(ChangeNotifier::new()),
    }
}

/// Issues a bearer token for `state`'s configured secret, usable directly
/// against a router built from the same state.
pub fn bearer_token(state: &AppState, user_id: i32, role: Role) -> String {
    kitchensync::auth::issue_token(
        &state.config.jwt_secret_key,
        &state.config.jwt_algorithm,
        state.config.jwt_access_token_ttl_minutes,
        user_id,
        "test@kitchensync.local",
        role,
    )
    .expect("issue test token")
}
