pub mod recipe;
pub mod reference;
pub mod user;

pub use recipe::{
    ChildCollection, IngredientLink, NewImage, NewRecipe, Recipe, RecipeFields, RecipeImage,
    RecipeIngredient,
};
pub use reference::{Ingredient, NewIngredient, NewTag, ReferenceOutcome, Tag};
pub use user::{NewUser, User};

/// Current time as fixed-width RFC 3339 (UTC, microseconds), so that
/// string order in the database equals chronological order.
#[must_use]
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
