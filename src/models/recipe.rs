use crate::domain::{ImageId, IngredientId, RecipeId, TagId, UserId};
use crate::entities::recipe_images;
use crate::models::reference::Tag;
use crate::validation::{
    FieldRule, FieldValue, IMAGE_RULES, INGREDIENT_LINK_RULES, RECIPE_RULES, Validate,
};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_SERVING_UNIT: &str = "people";

/// A fully materialized recipe: the base row plus its child collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub serving_unit: String,
    pub created_by: UserId,
    /// Username of the owner
    pub author: String,
    pub created_at: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub tags: Vec<Tag>,
    pub images: Vec<RecipeImage>,
    /// Child collections that could not be fetched and are shown empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<ChildCollection>,
}

impl Recipe {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub ingredient_id: IngredientId,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeImage {
    pub id: ImageId,
    pub filename: String,
    pub caption: Option<String>,
    pub display_order: i32,
}

impl From<recipe_images::Model> for RecipeImage {
    fn from(model: recipe_images::Model) -> Self {
        Self {
            id: ImageId::new(model.id),
            filename: model.filename,
            caption: model.caption,
            display_order: model.display_order,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildCollection {
    Ingredients,
    Tags,
    Images,
}

impl ChildCollection {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ingredients => "ingredients",
            Self::Tags => "tags",
            Self::Images => "images",
        }
    }
}

impl fmt::Display for ChildCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base recipe row joined with the owner's username.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct RecipeRow {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub serving_unit: String,
    pub created_by: i32,
    pub created_at: String,
    pub author: String,
}

impl RecipeRow {
    #[must_use]
    pub const fn recipe_id(&self) -> RecipeId {
        RecipeId::new(self.id)
    }

    /// Converts the row into a recipe with empty child collections.
    #[must_use]
    pub fn into_recipe(self) -> Recipe {
        Recipe {
            id: RecipeId::new(self.id),
            title: self.title,
            description: self.description,
            instructions: self.instructions,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings: self.servings,
            serving_unit: self.serving_unit,
            created_by: UserId::new(self.created_by),
            author: self.author,
            created_at: self.created_at,
            ingredients: Vec::new(),
            tags: Vec::new(),
            images: Vec::new(),
            degraded: Vec::new(),
        }
    }
}

/// Scalar fields of a recipe, as supplied on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFields {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub instructions: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    #[serde(default)]
    pub serving_unit: Option<String>,
}

impl RecipeFields {
    /// Trims the title and serving unit, falling back to
    /// [`DEFAULT_SERVING_UNIT`] when no unit is given. Description and
    /// instructions are free text and are kept exactly as given.
    #[must_use]
    pub fn normalized(self) -> Self {
        let serving_unit = self
            .serving_unit
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVING_UNIT.to_string());

        Self {
            title: self.title.trim().to_string(),
            serving_unit: Some(serving_unit),
            ..self
        }
    }

    #[must_use]
    pub fn serving_unit_or_default(&self) -> &str {
        self.serving_unit.as_deref().unwrap_or(DEFAULT_SERVING_UNIT)
    }
}

impl Validate for RecipeFields {
    const RULES: &'static [FieldRule] = RECIPE_RULES;

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "title" => FieldValue::Text(Some(&self.title)),
            "description" => FieldValue::Text(self.description.as_deref()),
            "instructions" => FieldValue::Text(Some(&self.instructions)),
            "prep_time" => FieldValue::Integer(Some(i64::from(self.prep_time))),
            "cook_time" => FieldValue::Integer(Some(i64::from(self.cook_time))),
            "servings" => FieldValue::Integer(Some(i64::from(self.servings))),
            "serving_unit" => FieldValue::Text(self.serving_unit.as_deref()),
            _ => FieldValue::Text(None),
        }
    }
}

/// One ingredient attached to a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLink {
    pub ingredient_id: IngredientId,
    pub quantity: f64,
    pub unit: String,
}

impl IngredientLink {
    pub fn new(ingredient_id: IngredientId, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            ingredient_id,
            quantity,
            unit: unit.into().trim().to_string(),
        }
    }
}

impl Validate for IngredientLink {
    const RULES: &'static [FieldRule] = INGREDIENT_LINK_RULES;

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "quantity" => FieldValue::Decimal(Some(self.quantity)),
            "unit" => FieldValue::Text(Some(&self.unit)),
            _ => FieldValue::Text(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImage {
    pub filename: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

impl NewImage {
    pub fn new(filename: impl Into<String>, caption: Option<String>, display_order: i32) -> Self {
        Self {
            filename: filename.into().trim().to_string(),
            caption: caption
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            display_order,
        }
    }
}

impl Validate for NewImage {
    const RULES: &'static [FieldRule] = IMAGE_RULES;

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "filename" => FieldValue::Text(Some(&self.filename)),
            "caption" => FieldValue::Text(self.caption.as_deref()),
            "display_order" => FieldValue::Integer(Some(i64::from(self.display_order))),
            _ => FieldValue::Text(None),
        }
    }
}

/// A recipe together with every child row to insert alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub fields: RecipeFields,
    #[serde(default)]
    pub ingredients: Vec<IngredientLink>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    #[serde(default)]
    pub images: Vec<NewImage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    fn fields() -> RecipeFields {
        RecipeFields {
            title: "  Margherita Pizza ".to_string(),
            description: Some("   ".to_string()),
            instructions: "Bake with tomatoes".to_string(),
            prep_time: 20,
            cook_time: 15,
            servings: 2,
            serving_unit: None,
        }
    }

    #[test]
    fn normalization_trims_and_defaults() {
        let f = fields().normalized();
        assert_eq!(f.title, "Margherita Pizza");
        assert_eq!(f.serving_unit.as_deref(), Some(DEFAULT_SERVING_UNIT));
    }

    #[test]
    fn normalization_keeps_free_text_verbatim() {
        let mut f = fields();
        f.instructions = "  1. Mix.\n2. Bake.\n".to_string();
        let f = f.normalized();
        assert_eq!(f.description.as_deref(), Some("   "));
        assert_eq!(f.instructions, "  1. Mix.\n2. Bake.\n");
        assert!(validate(&f).is_ok());
    }

    #[test]
    fn recipe_rules_check_ranges_in_order() {
        let mut f = fields().normalized();
        assert!(validate(&f).is_ok());

        f.cook_time = 1441;
        f.servings = 0;
        let err = validate(&f).unwrap_err();
        assert_eq!(err.field, "cook_time");
    }

    #[test]
    fn serving_unit_is_bounded() {
        let mut f = fields();
        f.serving_unit = Some("x".repeat(21));
        assert_eq!(validate(&f.normalized()).unwrap_err().field, "serving_unit");
    }

    #[test]
    fn ingredient_link_quantity_must_be_positive() {
        let link = IngredientLink::new(IngredientId::new(1), 0.0, "g");
        assert_eq!(validate(&link).unwrap_err().field, "quantity");

        let link = IngredientLink::new(IngredientId::new(1), 10_000.5, "g");
        assert_eq!(validate(&link).unwrap_err().field, "quantity");

        let link = IngredientLink::new(IngredientId::new(1), 2.5, " ");
        assert_eq!(validate(&link).unwrap_err().field, "unit");
    }

    #[test]
    fn image_rules() {
        assert!(validate(&NewImage::new("pizza.jpg", None, 0)).is_ok());
        assert_eq!(
            validate(&NewImage::new("pizza.jpg", None, -1))
                .unwrap_err()
                .field,
            "display_order"
        );
        assert_eq!(
            validate(&NewImage::new("", None, 0)).unwrap_err().field,
            "filename"
        );
    }
}
