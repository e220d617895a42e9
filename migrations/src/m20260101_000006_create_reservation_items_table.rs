use sea_orm_migration::prelude::*;

use crate::m20260101_000003_create_menu_items_table::MenuItems;
use crate::m20260101_000005_create_reservations_table::Reservations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReservationItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReservationItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReservationItems::ReservationId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationItems::MenuItemId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReservationItems::Qty).integer().not_null())
                    .col(ColumnDef::new(ReservationItems::Notes).string().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_items_reservation")
                            .from(ReservationItems::Table, ReservationItems::ReservationId)
                            .to(Reservations::Table, Reservations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_items_menu_item")
                            .from(ReservationItems::Table, ReservationItems::MenuItemId)
                            .to(MenuItems::Table, MenuItems::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_reservation_item")
                    .table(ReservationItems::Table)
                    .col(ReservationItems::ReservationId)
                    .col(ReservationItems::MenuItemId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReservationItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ReservationItems {
    Table,
    Id,
    ReservationId,
    MenuItemId,
    Qty,
    Notes,
}
