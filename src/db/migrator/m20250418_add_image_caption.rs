use super::add_column_if_missing;
use super::m20250301_create_catalog_tables::{IMAGE_ORDER_INDEX, image_order_index};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        add_column_if_missing(
            manager,
            "recipe_images",
            "caption",
            ColumnDef::new(RecipeImages::Caption)
                .string_len(200)
                .null()
                .to_owned(),
        )
        .await?;

        add_column_if_missing(
            manager,
            "recipe_images",
            "display_order",
            ColumnDef::new(RecipeImages::DisplayOrder)
                .integer()
                .not_null()
                .default(0)
                .to_owned(),
        )
        .await?;

        manager.create_index(image_order_index()).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite refuses to drop an indexed column.
        manager
            .drop_index(Index::drop().if_exists().name(IMAGE_ORDER_INDEX).to_owned())
            .await?;

        // One column per ALTER TABLE on SQLite.
        for column in [RecipeImages::Caption, RecipeImages::DisplayOrder] {
            manager
                .alter_table(
                    Table::alter()
                        .table(RecipeImages::Table)
                        .drop_column(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
enum RecipeImages {
    Table,
    Caption,
    DisplayOrder,
}
