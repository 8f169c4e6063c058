use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use tracing::info;

use crate::domain::{RecipeId, TagId, UserId};
use crate::entities::{prelude::*, recipe_tags, tags};
use crate::models::{NewTag, ReferenceOutcome, Tag};

use super::recipe::{exec_if_owned, owned_recipe_ids, owner_of};

const LINK_OWNED_SQL: &str = "INSERT INTO recipe_tags (recipe_id, tag_id) SELECT ?, ?";

/// Repository for shared tags and their recipe links
pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert-or-ignore by name. An existing tag keeps its color.
    pub async fn create(&self, tag: &NewTag) -> Result<ReferenceOutcome<TagId>> {
        let active_model = tags::ActiveModel {
            name: Set(tag.name.clone()),
            color: Set(tag.color.clone()),
            ..Default::default()
        };

        let inserted = Tags::insert(active_model)
            .on_conflict(OnConflict::column(tags::Column::Name).do_nothing().to_owned())
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert tag")?;

        let id = Tags::find()
            .filter(tags::Column::Name.eq(tag.name.as_str()))
            .select_only()
            .column(tags::Column::Id)
            .into_tuple::<i32>()
            .one(&self.conn)
            .await
            .context("Failed to look up tag by name")?
            .map(TagId::new)
            .ok_or_else(|| anyhow::anyhow!("Tag '{}' missing after insert", tag.name))?;

        if inserted > 0 {
            info!("Created tag {} ({})", tag.name, id);
            Ok(ReferenceOutcome::Created(id))
        } else {
            Ok(ReferenceOutcome::Existing(id))
        }
    }

    /// Deletes a tag; its recipe links cascade.
    pub async fn delete(&self, id: TagId) -> Result<bool> {
        let result = Tags::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete tag")?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Deleted tag {}", id);
        }
        Ok(removed)
    }

    pub async fn get(&self, id: TagId) -> Result<Option<Tag>> {
        let tag = Tags::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query tag")?;

        Ok(tag.map(Tag::from))
    }

    pub async fn list(&self) -> Result<Vec<Tag>> {
        let rows = Tags::find()
            .order_by_asc(tags::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list tags")?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    /// Tags of one recipe, ordered by name.
    pub async fn for_recipe(&self, recipe_id: RecipeId) -> Result<Vec<Tag>> {
        let rows = Tags::find()
            .join(JoinType::InnerJoin, tags::Relation::RecipeTags.def())
            .filter(recipe_tags::Column::RecipeId.eq(recipe_id.value()))
            .order_by_asc(tags::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query recipe tags")?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    /// Links a tag to a recipe owned by `caller`. Linking twice is a no-op.
    /// Returns `false` when `caller` does not own the recipe.
    pub async fn link_owned(&self, recipe_id: RecipeId, tag_id: TagId, caller: UserId) -> Result<bool> {
        let result = exec_if_owned(
            &self.conn,
            LINK_OWNED_SQL,
            "ON CONFLICT (recipe_id, tag_id) DO NOTHING",
            vec![recipe_id.value().into(), tag_id.value().into()],
            recipe_id,
            caller,
        )
        .await
        .with_context(|| format!("Failed to link tag {tag_id} to recipe {recipe_id}"))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Nothing inserted: either already linked, or not the caller's recipe.
        Ok(owner_of(&self.conn, recipe_id).await? == Some(caller))
    }

    pub async fn unlink_owned(
        &self,
        recipe_id: RecipeId,
        tag_id: TagId,
        caller: UserId,
    ) -> Result<bool> {
        let result = RecipeTags::delete_many()
            .filter(recipe_tags::Column::RecipeId.eq(recipe_id.value()))
            .filter(recipe_tags::Column::TagId.eq(tag_id.value()))
            .filter(recipe_tags::Column::RecipeId.in_subquery(owned_recipe_ids(caller)))
            .exec(&self.conn)
            .await
            .context("Failed to unlink tag")?;

        Ok(result.rows_affected > 0)
    }
}

/// Idempotent: linking an already linked tag is a no-op.
pub(crate) async fn insert_link<C: ConnectionTrait>(
    conn: &C,
    recipe_id: RecipeId,
    tag_id: TagId,
) -> Result<()> {
    let active_model = recipe_tags::ActiveModel {
        recipe_id: Set(recipe_id.value()),
        tag_id: Set(tag_id.value()),
    };

    RecipeTags::insert(active_model)
        .on_conflict(
            OnConflict::columns([recipe_tags::Column::RecipeId, recipe_tags::Column::TagId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .with_context(|| format!("Failed to link tag {tag_id} to recipe {recipe_id}"))?;

    Ok(())
}
