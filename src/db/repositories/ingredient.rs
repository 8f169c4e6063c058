use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::info;

use crate::domain::{IngredientId, RecipeId, UserId};
use crate::entities::{ingredients, prelude::*, recipe_ingredients};
use crate::models::{Ingredient, IngredientLink, RecipeIngredient, ReferenceOutcome};

use super::recipe::{exec_if_owned, owned_recipe_ids};

const LINK_OWNED_SQL: &str =
    "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, unit) SELECT ?, ?, ?, ?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Still linked from this many recipes; nothing was deleted.
    InUse(u64),
    Missing,
}

/// Repository for shared ingredients and their recipe links
pub struct IngredientRepository {
    conn: DatabaseConnection,
}

impl IngredientRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert-or-ignore by name.
    pub async fn create(&self, name: &str) -> Result<ReferenceOutcome<IngredientId>> {
        let active_model = ingredients::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        let inserted = Ingredients::insert(active_model)
            .on_conflict(
                OnConflict::column(ingredients::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert ingredient")?;

        let id = Ingredients::find()
            .filter(ingredients::Column::Name.eq(name))
            .select_only()
            .column(ingredients::Column::Id)
            .into_tuple::<i32>()
            .one(&self.conn)
            .await
            .context("Failed to look up ingredient by name")?
            .map(IngredientId::new)
            .ok_or_else(|| anyhow::anyhow!("Ingredient '{name}' missing after insert"))?;

        if inserted > 0 {
            info!("Created ingredient {} ({})", name, id);
            Ok(ReferenceOutcome::Created(id))
        } else {
            Ok(ReferenceOutcome::Existing(id))
        }
    }

    /// Deletes an ingredient only if no recipe links to it. The link check
    /// and the delete run as one statement.
    pub async fn delete(&self, id: IngredientId) -> Result<DeleteOutcome> {
        let unused = Expr::exists(
            Query::select()
                .expr(Expr::val(1))
                .from(RecipeIngredients)
                .and_where(recipe_ingredients::Column::IngredientId.eq(id.value()))
                .to_owned(),
        )
        .not();

        let result = Ingredients::delete_many()
            .filter(ingredients::Column::Id.eq(id.value()))
            .filter(unused)
            .exec(&self.conn)
            .await
            .context("Failed to delete ingredient")?;

        if result.rows_affected > 0 {
            info!("Deleted ingredient {}", id);
            return Ok(DeleteOutcome::Deleted);
        }

        let in_use = self.usage_count(id).await?;
        if in_use > 0 {
            Ok(DeleteOutcome::InUse(in_use))
        } else {
            Ok(DeleteOutcome::Missing)
        }
    }

    /// Number of recipes linking to this ingredient.
    pub async fn usage_count(&self, id: IngredientId) -> Result<u64> {
        RecipeIngredients::find()
            .filter(recipe_ingredients::Column::IngredientId.eq(id.value()))
            .count(&self.conn)
            .await
            .context("Failed to count ingredient usage")
    }

    pub async fn list(&self) -> Result<Vec<Ingredient>> {
        let rows = Ingredients::find()
            .order_by_asc(ingredients::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list ingredients")?;

        Ok(rows.into_iter().map(Ingredient::from).collect())
    }

    /// Ingredient links of one recipe, ordered by ingredient name.
    pub async fn links_for_recipe(&self, recipe_id: RecipeId) -> Result<Vec<RecipeIngredient>> {
        let rows = RecipeIngredients::find()
            .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id.value()))
            .find_also_related(Ingredients)
            .order_by_asc(ingredients::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query recipe ingredients")?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, ingredient)| {
                ingredient.map(|i| RecipeIngredient {
                    ingredient_id: IngredientId::new(i.id),
                    name: i.name,
                    quantity: link.quantity,
                    unit: link.unit,
                })
            })
            .collect())
    }

    /// Links an ingredient to a recipe owned by `caller`, replacing quantity
    /// and unit if already linked. Returns `false` when the caller does not
    /// own the recipe.
    pub async fn link_owned(
        &self,
        recipe_id: RecipeId,
        link: &IngredientLink,
        caller: UserId,
    ) -> Result<bool> {
        let result = exec_if_owned(
            &self.conn,
            LINK_OWNED_SQL,
            "ON CONFLICT (recipe_id, ingredient_id) \
             DO UPDATE SET quantity = excluded.quantity, unit = excluded.unit",
            vec![
                recipe_id.value().into(),
                link.ingredient_id.value().into(),
                link.quantity.into(),
                link.unit.clone().into(),
            ],
            recipe_id,
            caller,
        )
        .await
        .with_context(|| {
            format!(
                "Failed to link ingredient {} to recipe {}",
                link.ingredient_id, recipe_id
            )
        })?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn unlink_owned(
        &self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
        caller: UserId,
    ) -> Result<bool> {
        let result = RecipeIngredients::delete_many()
            .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id.value()))
            .filter(recipe_ingredients::Column::IngredientId.eq(ingredient_id.value()))
            .filter(recipe_ingredients::Column::RecipeId.in_subquery(owned_recipe_ids(caller)))
            .exec(&self.conn)
            .await
            .context("Failed to unlink ingredient")?;

        Ok(result.rows_affected > 0)
    }
}

pub(crate) async fn upsert_link<C: ConnectionTrait>(
    conn: &C,
    recipe_id: RecipeId,
    link: &IngredientLink,
) -> Result<()> {
    let active_model = recipe_ingredients::ActiveModel {
        recipe_id: Set(recipe_id.value()),
        ingredient_id: Set(link.ingredient_id.value()),
        quantity: Set(link.quantity),
        unit: Set(link.unit.clone()),
    };

    RecipeIngredients::insert(active_model)
        .on_conflict(
            OnConflict::columns([
                recipe_ingredients::Column::RecipeId,
                recipe_ingredients::Column::IngredientId,
            ])
            .update_columns([
                recipe_ingredients::Column::Quantity,
                recipe_ingredients::Column::Unit,
            ])
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .with_context(|| {
            format!(
                "Failed to link ingredient {} to recipe {}",
                link.ingredient_id, recipe_id
            )
        })?;

    Ok(())
}
