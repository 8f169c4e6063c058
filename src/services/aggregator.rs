//! Materializes recipes from base rows.
//!
//! Each recipe needs three child queries. A failing child query leaves that
//! collection empty and names it in [`Recipe::degraded`] instead of failing
//! the whole read.

use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::db::Store;
use crate::domain::RecipeId;
use crate::models::recipe::RecipeRow;
use crate::models::{ChildCollection, Recipe};

#[derive(Clone)]
pub struct RecipeAggregator {
    store: Store,
    concurrency: usize,
}

impl RecipeAggregator {
    #[must_use]
    pub fn new(store: Store, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Loads one recipe, or `None` if no row has this id.
    pub async fn load_recipe(&self, id: RecipeId) -> anyhow::Result<Option<Recipe>> {
        let Some(row) = self.store.recipe_row(id).await? else {
            return Ok(None);
        };

        Ok(Some(self.assemble(row).await))
    }

    /// Aggregates every row, several at a time, keeping the input order.
    pub async fn load_recipe_list(&self, rows: Vec<RecipeRow>) -> Vec<Recipe> {
        stream::iter(rows)
            .map(|row| self.assemble(row))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn assemble(&self, row: RecipeRow) -> Recipe {
        let id = row.recipe_id();

        let (ingredients, tags, images) = tokio::join!(
            self.store.recipe_ingredients(id),
            self.store.recipe_tags(id),
            self.store.recipe_images(id),
        );

        let mut recipe = row.into_recipe();
        recipe.ingredients = settle(
            id,
            ChildCollection::Ingredients,
            ingredients,
            &mut recipe.degraded,
        );
        recipe.tags = settle(id, ChildCollection::Tags, tags, &mut recipe.degraded);
        recipe.images = settle(id, ChildCollection::Images, images, &mut recipe.degraded);
        recipe
    }
}

fn settle<T>(
    id: RecipeId,
    kind: ChildCollection,
    result: anyhow::Result<Vec<T>>,
    degraded: &mut Vec<ChildCollection>,
) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(
                recipe_id = id.value(),
                collection = kind.as_str(),
                "Failed to load recipe {}, returning it without: {:#}",
                kind,
                e
            );
            metrics::counter!("recipebox_aggregate_degraded_total", "collection" => kind.as_str())
                .increment(1);
            degraded.push(kind);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_marks_failed_collections() {
        let mut degraded = Vec::new();

        let ok: Vec<i32> = settle(
            RecipeId::new(1),
            ChildCollection::Tags,
            Ok(vec![1, 2]),
            &mut degraded,
        );
        assert_eq!(ok, vec![1, 2]);
        assert!(degraded.is_empty());

        let failed: Vec<i32> = settle(
            RecipeId::new(1),
            ChildCollection::Images,
            Err(anyhow::anyhow!("no such table: recipe_images")),
            &mut degraded,
        );
        assert!(failed.is_empty());
        assert_eq!(degraded, vec![ChildCollection::Images]);
    }
}
