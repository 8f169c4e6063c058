//! Domain service for the recipe catalog.
//!
//! Every operation validates its input before touching the store, scopes
//! recipe mutations to the caller, and returns a [`CatalogError`] that a
//! handler layer can map onto its own responses.

use crate::domain::{ImageId, IngredientId, RecipeId, TagId, UserId};
use crate::models::{Ingredient, NewRecipe, Recipe, RecipeFields, ReferenceOutcome, Tag, User};
use crate::validation::ValidationError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Deliberately does not say which of the two applies.
    #[error("Recipe not found or not owned by caller")]
    NotFoundOrForbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Still used by {0} recipe(s)")]
    InUse(u64),

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Timed out: {0}")]
    Timeout(&'static str),
}

impl From<ValidationError> for CatalogError {
    fn from(err: ValidationError) -> Self {
        Self::Validation {
            field: err.field,
            reason: err.reason,
        }
    }
}

impl From<DbErr> for CatalogError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => Self::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                Self::NotFound("Referenced record".to_string())
            }
            _ => Self::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DbErr>().and_then(DbErr::sql_err) {
            Some(SqlErr::UniqueConstraintViolation(msg)) => Self::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                Self::NotFound("Referenced record".to_string())
            }
            _ => Self::StoreUnavailable(format!("{err:#}")),
        }
    }
}

/// Domain service trait for the catalog.
#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    // Users

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserId, CatalogError>;

    async fn get_user(&self, id: UserId) -> Result<User, CatalogError>;

    /// Returns the user together with the stored password hash.
    async fn find_user_by_username(&self, username: &str)
    -> Result<(User, String), CatalogError>;

    // Recipes

    /// Inserts the base row only. Children are linked by separate calls.
    async fn create_recipe(
        &self,
        fields: RecipeFields,
        owner: UserId,
    ) -> Result<RecipeId, CatalogError>;

    /// Inserts the recipe and all its children atomically.
    async fn create_recipe_with_children(
        &self,
        recipe: NewRecipe,
        owner: UserId,
    ) -> Result<RecipeId, CatalogError>;

    async fn get_recipe(&self, id: RecipeId) -> Result<Recipe, CatalogError>;

    async fn update_recipe(
        &self,
        id: RecipeId,
        fields: RecipeFields,
        caller: UserId,
    ) -> Result<(), CatalogError>;

    async fn delete_recipe(&self, id: RecipeId, caller: UserId) -> Result<(), CatalogError>;

    /// Ranked, deduplicated free-text search.
    async fn search_recipes(&self, term: &str) -> Result<Vec<Recipe>, CatalogError>;

    async fn list_recipes_by_tag(&self, tag_id: TagId) -> Result<Vec<Recipe>, CatalogError>;

    async fn list_all_recipes(&self) -> Result<Vec<Recipe>, CatalogError>;

    async fn list_recipes_by_owner(&self, owner: UserId) -> Result<Vec<Recipe>, CatalogError>;

    /// `NotFound` when the recipe does not exist, unlike `Ok(false)`.
    async fn user_owns_recipe(&self, id: RecipeId, caller: UserId) -> Result<bool, CatalogError>;

    // Ingredients

    async fn create_ingredient(
        &self,
        name: &str,
    ) -> Result<ReferenceOutcome<IngredientId>, CatalogError>;

    async fn delete_ingredient(&self, id: IngredientId) -> Result<(), CatalogError>;

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, CatalogError>;

    async fn link_ingredient(
        &self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
        quantity: f64,
        unit: &str,
        caller: UserId,
    ) -> Result<(), CatalogError>;

    async fn unlink_ingredient(
        &self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
        caller: UserId,
    ) -> Result<(), CatalogError>;

    // Tags

    async fn create_tag(
        &self,
        name: &str,
        color: Option<&str>,
    ) -> Result<ReferenceOutcome<TagId>, CatalogError>;

    async fn delete_tag(&self, id: TagId) -> Result<(), CatalogError>;

    async fn get_tag(&self, id: TagId) -> Result<Tag, CatalogError>;

    async fn list_tags(&self) -> Result<Vec<Tag>, CatalogError>;

    async fn link_tag(
        &self,
        recipe_id: RecipeId,
        tag_id: TagId,
        caller: UserId,
    ) -> Result<(), CatalogError>;

    async fn unlink_tag(
        &self,
        recipe_id: RecipeId,
        tag_id: TagId,
        caller: UserId,
    ) -> Result<(), CatalogError>;

    // Images

    async fn add_image(
        &self,
        recipe_id: RecipeId,
        filename: &str,
        caption: Option<&str>,
        display_order: i32,
        caller: UserId,
    ) -> Result<ImageId, CatalogError>;

    async fn remove_image(&self, id: ImageId, caller: UserId) -> Result<(), CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_keeps_field_and_reason() {
        let err = CatalogError::from(ValidationError {
            field: "title",
            reason: "is required".to_string(),
        });
        assert!(matches!(
            err,
            CatalogError::Validation { field: "title", .. }
        ));
        assert_eq!(err.to_string(), "Invalid title: is required");
    }

    #[test]
    fn generic_db_errors_are_store_unavailable() {
        let err = CatalogError::from(DbErr::Custom("disk I/O error".to_string()));
        assert!(matches!(err, CatalogError::StoreUnavailable(_)));

        let err = CatalogError::from(
            anyhow::Error::new(DbErr::Custom("locked".to_string())).context("Failed to insert"),
        );
        match err {
            CatalogError::StoreUnavailable(msg) => assert!(msg.contains("locked")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ownership_failures_do_not_leak_existence() {
        assert_eq!(
            CatalogError::NotFoundOrForbidden.to_string(),
            "Recipe not found or not owned by caller"
        );
    }
}
