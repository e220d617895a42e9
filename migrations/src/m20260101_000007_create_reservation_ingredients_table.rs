use sea_orm_migration::prelude::*;

use crate::m20260101_000002_create_ingredients_table::Ingredients;
use crate::m20260101_000005_create_reservations_table::Reservations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReservationIngredients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReservationIngredients::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReservationIngredients::ReservationId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationIngredients::IngredientId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationIngredients::QtyReserved)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_ingredients_reservation")
                            .from(
                                ReservationIngredients::Table,
                                ReservationIngredients::ReservationId,
                            )
                            .to(Reservations::Table, Reservations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_ingredients_ingredient")
                            .from(
                                ReservationIngredients::Table,
                                ReservationIngredients::IngredientId,
                            )
                            .to(Ingredients::Table, Ingredients::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_reservation_ingredient")
                    .table(ReservationIngredients::Table)
                    .col(ReservationIngredients::ReservationId)
                    .col(ReservationIngredients::IngredientId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_reservation_ingredients_ingredient_id")
                    .table(ReservationIngredients::Table)
                    .col(ReservationIngredients::IngredientId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReservationIngredients::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ReservationIngredients {
    Table,
    Id,
    ReservationId,
    IngredientId,
    QtyReserved,
}
