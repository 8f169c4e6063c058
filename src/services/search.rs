//! Free-text recipe search.

use std::collections::HashSet;
use tracing::debug;

use crate::db::{Store, like_pattern};
use crate::models::Recipe;
use crate::models::recipe::RecipeRow;
use crate::services::aggregator::RecipeAggregator;
use crate::services::catalog_service::CatalogError;
use crate::validation::{SearchQuery, validate};

pub struct SearchService {
    store: Store,
    aggregator: RecipeAggregator,
    /// 0 disables the cap
    result_limit: usize,
}

impl SearchService {
    #[must_use]
    pub const fn new(store: Store, aggregator: RecipeAggregator, result_limit: usize) -> Self {
        Self {
            store,
            aggregator,
            result_limit,
        }
    }

    /// Matches `raw` against recipe title, description, instructions and the
    /// names of linked ingredients and tags. Title matches rank first, then
    /// newest first.
    pub async fn search(&self, raw: &str) -> Result<Vec<Recipe>, CatalogError> {
        let query = SearchQuery(raw);
        validate(&query).map_err(|e| CatalogError::InvalidQuery(e.reason))?;

        let pattern = like_pattern(query.term());
        let rows = self.store.search_recipe_rows(&pattern).await?;
        let raw_count = rows.len();

        let rows = dedup_rows(rows, self.result_limit);
        debug!(
            term = query.term(),
            raw_rows = raw_count,
            results = rows.len(),
            "Search finished"
        );

        Ok(self.aggregator.load_recipe_list(rows).await)
    }
}

/// Keeps the first row per recipe id, in order, then caps the list.
fn dedup_rows(rows: Vec<RecipeRow>, limit: usize) -> Vec<RecipeRow> {
    let limit = if limit == 0 { usize::MAX } else { limit };
    let mut seen = HashSet::new();

    rows.into_iter()
        .filter(|row| seen.insert(row.id))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32, title: &str) -> RecipeRow {
        RecipeRow {
            id,
            title: title.to_string(),
            description: None,
            instructions: "Mix".to_string(),
            prep_time: 1,
            cook_time: 1,
            servings: 1,
            serving_unit: "people".to_string(),
            created_by: 1,
            created_at: "2025-01-01T00:00:00.000000Z".to_string(),
            author: "chef".to_string(),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let rows = vec![row(3, "a"), row(1, "b"), row(3, "a"), row(2, "c"), row(1, "b")];
        let ids: Vec<i32> = dedup_rows(rows, 0).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn limit_applies_after_dedup() {
        let rows = vec![row(1, "a"), row(1, "a"), row(1, "a"), row(2, "b"), row(3, "c")];
        let ids: Vec<i32> = dedup_rows(rows, 2).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
