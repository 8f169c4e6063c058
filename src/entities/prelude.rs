pub use super::ingredients::Entity as Ingredients;
pub use super::recipe_images::Entity as RecipeImages;
pub use super::recipe_ingredients::Entity as RecipeIngredients;
pub use super::recipe_tags::Entity as RecipeTags;
pub use super::recipes::Entity as Recipes;
pub use super::tags::Entity as Tags;
pub use super::users::Entity as Users;
