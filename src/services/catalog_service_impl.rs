//! `SeaORM` implementation of the `CatalogService` trait.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::db::{DeleteOutcome, Store};
use crate::domain::{ImageId, IngredientId, RecipeId, TagId, UserId};
use crate::models::{
    Ingredient, IngredientLink, NewImage, NewIngredient, NewRecipe, NewTag, NewUser, Recipe,
    RecipeFields, ReferenceOutcome, Tag, User,
};
use crate::services::aggregator::RecipeAggregator;
use crate::services::catalog_service::{CatalogError, CatalogService};
use crate::services::search::SearchService;
use crate::validation::validate;

pub struct SeaOrmCatalogService {
    store: Store,
    aggregator: RecipeAggregator,
    search: SearchService,
    query_timeout: Duration,
}

impl SeaOrmCatalogService {
    #[must_use]
    pub fn new(store: Store, config: &StoreConfig) -> Self {
        let aggregator = RecipeAggregator::new(store.clone(), config.aggregate_concurrency);
        let search = SearchService::new(
            store.clone(),
            aggregator.clone(),
            config.search_result_limit,
        );

        Self {
            store,
            aggregator,
            search,
            query_timeout: config.query_timeout(),
        }
    }

    /// Runs `fut` under the configured deadline. Dropping the future on
    /// expiry also drops any open transaction, which rolls it back.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, CatalogError>> + Send,
    ) -> Result<T, CatalogError> {
        if let Ok(result) = tokio::time::timeout(self.query_timeout, fut).await {
            result
        } else {
            warn!(
                "Catalog call {} exceeded {} ms",
                operation,
                self.query_timeout.as_millis()
            );
            Err(CatalogError::Timeout(operation))
        }
    }
}

/// Validates recipe children before anything is written.
fn validate_new_recipe(recipe: &NewRecipe) -> Result<(), CatalogError> {
    validate(&recipe.fields)?;
    for link in &recipe.ingredients {
        validate(link)?;
    }
    for image in &recipe.images {
        validate(image)?;
    }
    Ok(())
}

#[async_trait]
impl CatalogService for SeaOrmCatalogService {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserId, CatalogError> {
        let user = NewUser::new(username, email, password_hash);
        validate(&user)?;

        self.bounded("create_user", async {
            Ok(self.store.create_user(&user).await?)
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> Result<User, CatalogError> {
        self.bounded("get_user", async {
            self.store
                .get_user(id)
                .await?
                .ok_or_else(|| CatalogError::NotFound(format!("User {id}")))
        })
        .await
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<(User, String), CatalogError> {
        self.bounded("find_user_by_username", async {
            self.store
                .get_user_with_password(username.trim())
                .await?
                .ok_or_else(|| CatalogError::NotFound(format!("User '{}'", username.trim())))
        })
        .await
    }

    async fn create_recipe(
        &self,
        fields: RecipeFields,
        owner: UserId,
    ) -> Result<RecipeId, CatalogError> {
        let fields = fields.normalized();
        validate(&fields)?;

        self.bounded("create_recipe", async {
            Ok(self.store.insert_recipe(&fields, owner).await?)
        })
        .await
    }

    async fn create_recipe_with_children(
        &self,
        recipe: NewRecipe,
        owner: UserId,
    ) -> Result<RecipeId, CatalogError> {
        let recipe = NewRecipe {
            fields: recipe.fields.normalized(),
            ..recipe
        };
        validate_new_recipe(&recipe)?;

        self.bounded("create_recipe_with_children", async {
            Ok(self
                .store
                .insert_recipe_with_children(&recipe, owner)
                .await?)
        })
        .await
    }

    async fn get_recipe(&self, id: RecipeId) -> Result<Recipe, CatalogError> {
        self.bounded("get_recipe", async {
            self.aggregator
                .load_recipe(id)
                .await?
                .ok_or_else(|| CatalogError::NotFound(format!("Recipe {id}")))
        })
        .await
    }

    async fn update_recipe(
        &self,
        id: RecipeId,
        fields: RecipeFields,
        caller: UserId,
    ) -> Result<(), CatalogError> {
        let fields = fields.normalized();
        validate(&fields)?;

        self.bounded("update_recipe", async {
            if self.store.update_recipe_owned(id, &fields, caller).await? {
                Ok(())
            } else {
                Err(CatalogError::NotFoundOrForbidden)
            }
        })
        .await
    }

    async fn delete_recipe(&self, id: RecipeId, caller: UserId) -> Result<(), CatalogError> {
        self.bounded("delete_recipe", async {
            if self.store.delete_recipe_owned(id, caller).await? {
                Ok(())
            } else {
                Err(CatalogError::NotFoundOrForbidden)
            }
        })
        .await
    }

    async fn search_recipes(&self, term: &str) -> Result<Vec<Recipe>, CatalogError> {
        self.bounded("search_recipes", self.search.search(term))
            .await
    }

    async fn list_recipes_by_tag(&self, tag_id: TagId) -> Result<Vec<Recipe>, CatalogError> {
        self.bounded("list_recipes_by_tag", async {
            let rows = self.store.list_recipe_rows_by_tag(tag_id).await?;
            Ok(self.aggregator.load_recipe_list(rows).await)
        })
        .await
    }

    async fn list_all_recipes(&self) -> Result<Vec<Recipe>, CatalogError> {
        self.bounded("list_all_recipes", async {
            let rows = self.store.list_recipe_rows().await?;
            Ok(self.aggregator.load_recipe_list(rows).await)
        })
        .await
    }

    async fn list_recipes_by_owner(&self, owner: UserId) -> Result<Vec<Recipe>, CatalogError> {
        self.bounded("list_recipes_by_owner", async {
            let rows = self.store.list_recipe_rows_by_owner(owner).await?;
            Ok(self.aggregator.load_recipe_list(rows).await)
        })
        .await
    }

    async fn user_owns_recipe(&self, id: RecipeId, caller: UserId) -> Result<bool, CatalogError> {
        self.bounded("user_owns_recipe", async {
            let owner = self
                .store
                .recipe_owner(id)
                .await?
                .ok_or_else(|| CatalogError::NotFound(format!("Recipe {id}")))?;
            Ok(owner == caller)
        })
        .await
    }

    async fn create_ingredient(
        &self,
        name: &str,
    ) -> Result<ReferenceOutcome<IngredientId>, CatalogError> {
        let ingredient = NewIngredient::new(name);
        validate(&ingredient)?;

        self.bounded("create_ingredient", async {
            Ok(self.store.create_ingredient(&ingredient.name).await?)
        })
        .await
    }

    async fn delete_ingredient(&self, id: IngredientId) -> Result<(), CatalogError> {
        self.bounded("delete_ingredient", async {
            match self.store.delete_ingredient(id).await? {
                DeleteOutcome::Deleted => Ok(()),
                DeleteOutcome::InUse(count) => {
                    info!("Ingredient {} kept, used by {} recipes", id, count);
                    Err(CatalogError::InUse(count))
                }
                DeleteOutcome::Missing => Err(CatalogError::NotFound(format!("Ingredient {id}"))),
            }
        })
        .await
    }

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, CatalogError> {
        self.bounded("list_ingredients", async {
            Ok(self.store.list_ingredients().await?)
        })
        .await
    }

    async fn link_ingredient(
        &self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
        quantity: f64,
        unit: &str,
        caller: UserId,
    ) -> Result<(), CatalogError> {
        let link = IngredientLink::new(ingredient_id, quantity, unit);
        validate(&link)?;

        self.bounded("link_ingredient", async {
            if self
                .store
                .link_ingredient_owned(recipe_id, &link, caller)
                .await?
            {
                Ok(())
            } else {
                Err(CatalogError::NotFoundOrForbidden)
            }
        })
        .await
    }

    async fn unlink_ingredient(
        &self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
        caller: UserId,
    ) -> Result<(), CatalogError> {
        self.bounded("unlink_ingredient", async {
            if self
                .store
                .unlink_ingredient_owned(recipe_id, ingredient_id, caller)
                .await?
            {
                Ok(())
            } else {
                Err(CatalogError::NotFoundOrForbidden)
            }
        })
        .await
    }

    async fn create_tag(
        &self,
        name: &str,
        color: Option<&str>,
    ) -> Result<ReferenceOutcome<TagId>, CatalogError> {
        let tag = NewTag::new(name, color);
        validate(&tag)?;

        self.bounded("create_tag", async { Ok(self.store.create_tag(&tag).await?) })
            .await
    }

    async fn delete_tag(&self, id: TagId) -> Result<(), CatalogError> {
        self.bounded("delete_tag", async {
            if self.store.delete_tag(id).await? {
                Ok(())
            } else {
                Err(CatalogError::NotFound(format!("Tag {id}")))
            }
        })
        .await
    }

    async fn get_tag(&self, id: TagId) -> Result<Tag, CatalogError> {
        self.bounded("get_tag", async {
            self.store
                .get_tag(id)
                .await?
                .ok_or_else(|| CatalogError::NotFound(format!("Tag {id}")))
        })
        .await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, CatalogError> {
        self.bounded("list_tags", async { Ok(self.store.list_tags().await?) })
            .await
    }

    async fn link_tag(
        &self,
        recipe_id: RecipeId,
        tag_id: TagId,
        caller: UserId,
    ) -> Result<(), CatalogError> {
        self.bounded("link_tag", async {
            if self.store.link_tag_owned(recipe_id, tag_id, caller).await? {
                Ok(())
            } else {
                Err(CatalogError::NotFoundOrForbidden)
            }
        })
        .await
    }

    async fn unlink_tag(
        &self,
        recipe_id: RecipeId,
        tag_id: TagId,
        caller: UserId,
    ) -> Result<(), CatalogError> {
        self.bounded("unlink_tag", async {
            if self
                .store
                .unlink_tag_owned(recipe_id, tag_id, caller)
                .await?
            {
                Ok(())
            } else {
                Err(CatalogError::NotFoundOrForbidden)
            }
        })
        .await
    }

    async fn add_image(
        &self,
        recipe_id: RecipeId,
        filename: &str,
        caption: Option<&str>,
        display_order: i32,
        caller: UserId,
    ) -> Result<ImageId, CatalogError> {
        let image = NewImage::new(filename, caption.map(str::to_string), display_order);
        validate(&image)?;

        self.bounded("add_image", async {
            self.store
                .add_image_owned(recipe_id, &image, caller)
                .await?
                .ok_or(CatalogError::NotFoundOrForbidden)
        })
        .await
    }

    async fn remove_image(&self, id: ImageId, caller: UserId) -> Result<(), CatalogError> {
        self.bounded("remove_image", async {
            if self.store.remove_image_owned(id, caller).await? {
                Ok(())
            } else {
                Err(CatalogError::NotFoundOrForbidden)
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service(query_timeout_ms: u64) -> SeaOrmCatalogService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.ensure_schema().await.unwrap();
        let config = StoreConfig {
            query_timeout_ms,
            ..StoreConfig::default()
        };
        SeaOrmCatalogService::new(store, &config)
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let service = service(10).await;
        let err = service
            .bounded("slow", async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, CatalogError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Timeout("slow")));
    }

    #[tokio::test]
    async fn children_are_validated_before_writing() {
        let service = service(5_000).await;
        let owner = service
            .create_user("anna", "anna@example.org", "hash")
            .await
            .unwrap();

        let recipe = NewRecipe {
            fields: RecipeFields {
                title: "Toast".to_string(),
                description: None,
                instructions: "Toast the bread.".to_string(),
                prep_time: 1,
                cook_time: 3,
                servings: 1,
                serving_unit: None,
            },
            ingredients: vec![IngredientLink::new(IngredientId::new(1), -1.0, "g")],
            tag_ids: Vec::new(),
            images: Vec::new(),
        };

        let err = service
            .create_recipe_with_children(recipe, owner)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation { field: "quantity", .. }));
        assert!(service.list_all_recipes().await.unwrap().is_empty());
    }
}
