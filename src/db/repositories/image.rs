use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::domain::{ImageId, RecipeId, UserId};
use crate::entities::{prelude::*, recipe_images};
use crate::models::{NewImage, RecipeImage};

use super::recipe::{exec_if_owned, owned_recipe_ids};

const ADD_OWNED_SQL: &str =
    "INSERT INTO recipe_images (recipe_id, filename, caption, display_order) SELECT ?, ?, ?, ?";

/// Repository for recipe image records (filenames only)
pub struct ImageRepository {
    conn: DatabaseConnection,
}

impl ImageRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Images of one recipe in display order.
    pub async fn for_recipe(&self, recipe_id: RecipeId) -> Result<Vec<RecipeImage>> {
        let rows = RecipeImages::find()
            .filter(recipe_images::Column::RecipeId.eq(recipe_id.value()))
            .order_by_asc(recipe_images::Column::DisplayOrder)
            .order_by_asc(recipe_images::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query recipe images")?;

        Ok(rows.into_iter().map(RecipeImage::from).collect())
    }

    /// Returns `None` when `caller` does not own the recipe.
    pub async fn add_owned(
        &self,
        recipe_id: RecipeId,
        image: &NewImage,
        caller: UserId,
    ) -> Result<Option<ImageId>> {
        let result = exec_if_owned(
            &self.conn,
            ADD_OWNED_SQL,
            "",
            vec![
                recipe_id.value().into(),
                image.filename.clone().into(),
                image.caption.clone().into(),
                image.display_order.into(),
            ],
            recipe_id,
            caller,
        )
        .await
        .with_context(|| format!("Failed to add image to recipe {recipe_id}"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let id = i32::try_from(result.last_insert_id())
            .context("Image id does not fit the id column")?;
        info!("Added image {} to recipe {}", image.filename, recipe_id);
        Ok(Some(ImageId::new(id)))
    }

    pub async fn remove_owned(&self, id: ImageId, caller: UserId) -> Result<bool> {
        let result = RecipeImages::delete_many()
            .filter(recipe_images::Column::Id.eq(id.value()))
            .filter(recipe_images::Column::RecipeId.in_subquery(owned_recipe_ids(caller)))
            .exec(&self.conn)
            .await
            .context("Failed to remove image")?;

        Ok(result.rows_affected > 0)
    }
}

pub(crate) async fn insert<C: ConnectionTrait>(
    conn: &C,
    recipe_id: RecipeId,
    image: &NewImage,
) -> Result<ImageId> {
    let active_model = recipe_images::ActiveModel {
        recipe_id: Set(recipe_id.value()),
        filename: Set(image.filename.clone()),
        caption: Set(image.caption.clone()),
        display_order: Set(image.display_order),
        ..Default::default()
    };

    let res = RecipeImages::insert(active_model)
        .exec(conn)
        .await
        .with_context(|| format!("Failed to add image to recipe {recipe_id}"))?;

    Ok(ImageId::new(res.last_insert_id))
}
