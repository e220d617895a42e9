pub use sea_orm_migration::prelude::*;

pub mod m20260101_000001_create_users_table;
pub mod m20260101_000002_create_ingredients_table;
pub mod m20260101_000003_create_menu_items_table;
pub mod m20260101_000004_create_recipes_table;
pub mod m20260101_000005_create_reservations_table;
pub mod m20260101_000006_create_reservation_items_table;
pub mod m20260101_000007_create_reservation_ingredients_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_users_table::Migration),
            Box::new(m20260101_000002_create_ingredients_table::Migration),
            Box::new(m20260101_000003_create_menu_items_table::Migration),
            Box::new(m20260101_000004_create_recipes_table::Migration),
            Box::new(m20260101_000005_create_reservations_table::Migration),
            Box::new(m20260101_000006_create_reservation_items_table::Migration),
            Box::new(m20260101_000007_create_reservation_ingredients_table::Migration),
        ]
    }
}
