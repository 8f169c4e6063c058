//! Early stores kept a free-text `amount` on each ingredient link instead of
//! a numeric quantity and a unit. Those rows cannot be converted reliably, so
//! the link table is rebuilt empty. Recipes and ingredients are untouched.

use super::m20250301_create_catalog_tables::ingredient_link_index;
use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;
use tracing::warn;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager.has_column("recipe_ingredients", "amount").await? {
            return Ok(());
        }

        warn!("Legacy recipe_ingredients shape found, dropping existing ingredient links");

        manager
            .drop_table(Table::drop().table(RecipeIngredients).to_owned())
            .await?;

        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(
                schema
                    .create_table_from_entity(RecipeIngredients)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager.create_index(ingredient_link_index()).await
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Dropped rows are gone; there is nothing to restore.
        Ok(())
    }
}
