use crate::entities::{prelude::*, recipe_images, recipe_ingredients, recipe_tags, recipes};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create<E: EntityTrait>(
    manager: &SchemaManager<'_>,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    manager
        .create_table(
            schema
                .create_table_from_entity(entity)
                .if_not_exists()
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Parents before children so foreign keys resolve.
        create(manager, &schema, Users).await?;
        create(manager, &schema, Ingredients).await?;
        create(manager, &schema, Tags).await?;
        create(manager, &schema, Recipes).await?;
        create(manager, &schema, RecipeIngredients).await?;
        create(manager, &schema, RecipeTags).await?;
        create(manager, &schema, RecipeImages).await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_recipes_created_by")
                    .table(Recipes)
                    .col(recipes::Column::CreatedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_recipes_created_at")
                    .table(Recipes)
                    .col(recipes::Column::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(ingredient_link_index())
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_recipe_tags_tag")
                    .table(RecipeTags)
                    .col(recipe_tags::Column::TagId)
                    .to_owned(),
            )
            .await?;

        manager.create_index(image_order_index()).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecipeImages).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeTags).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeIngredients).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recipes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ingredients).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}

/// Reverse lookup used by the in-use check on ingredient deletion.
pub(super) fn ingredient_link_index() -> IndexCreateStatement {
    Index::create()
        .if_not_exists()
        .name("idx_recipe_ingredients_ingredient")
        .table(RecipeIngredients)
        .col(recipe_ingredients::Column::IngredientId)
        .to_owned()
}

pub(super) const IMAGE_ORDER_INDEX: &str = "idx_recipe_images_recipe";

/// Serves the per-recipe image listing in display order.
pub(super) fn image_order_index() -> IndexCreateStatement {
    Index::create()
        .if_not_exists()
        .name(IMAGE_ORDER_INDEX)
        .table(RecipeImages)
        .col(recipe_images::Column::RecipeId)
        .col(recipe_images::Column::DisplayOrder)
        .to_owned()
}
