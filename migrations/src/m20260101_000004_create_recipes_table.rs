use sea_orm_migration::prelude::*;

use crate::m20260101_000002_create_ingredients_table::Ingredients;
use crate::m20260101_000003_create_menu_items_table::MenuItems;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Recipes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Recipes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Recipes::MenuItemId).integer().not_null())
                    .col(ColumnDef::new(Recipes::IngredientId).integer().not_null())
                    .col(ColumnDef::new(Recipes::QtyRequired).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_menu_item")
                            .from(Recipes::Table, Recipes::MenuItemId)
                            .to(MenuItems::Table, MenuItems::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_ingredient")
                            .from(Recipes::Table, Recipes::IngredientId)
                            .to(Ingredients::Table, Ingredients::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_recipe_item_ingredient")
                    .table(Recipes::Table)
                    .col(Recipes::MenuItemId)
                    .col(Recipes::IngredientId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Recipes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Recipes {
    Table,
    Id,
    MenuItemId,
    IngredientId,
    QtyRequired,
}
