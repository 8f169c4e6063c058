//! Shared reference data: ingredients and tags.

use crate::domain::{IngredientId, TagId};
use crate::entities::{ingredients, tags};
use crate::validation::{FieldRule, FieldValue, INGREDIENT_RULES, TAG_RULES, Validate};
use serde::{Deserialize, Serialize};

/// Color given to tags whose requested color is not `#RRGGBB`.
pub const DEFAULT_TAG_COLOR: &str = "#6c757d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
}

impl From<ingredients::Model> for Ingredient {
    fn from(model: ingredients::Model) -> Self {
        Self {
            id: IngredientId::new(model.id),
            name: model.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

impl From<tags::Model> for Tag {
    fn from(model: tags::Model) -> Self {
        Self {
            id: TagId::new(model.id),
            name: model.name,
            color: model.color,
        }
    }
}

/// Result of an insert-or-ignore on a uniquely named row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "id", rename_all = "snake_case")]
pub enum ReferenceOutcome<Id> {
    Created(Id),
    /// A row with the same name already existed and was left as is.
    Existing(Id),
}

impl<Id: Copy> ReferenceOutcome<Id> {
    pub fn id(&self) -> Id {
        match self {
            Self::Created(id) | Self::Existing(id) => *id,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    pub name: String,
}

impl NewIngredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
        }
    }
}

impl Validate for NewIngredient {
    const RULES: &'static [FieldRule] = INGREDIENT_RULES;

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "name" => FieldValue::Text(Some(&self.name)),
            _ => FieldValue::Text(None),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    pub name: String,
    pub color: String,
}

impl NewTag {
    /// Builds a tag input; a missing or malformed color falls back to
    /// [`DEFAULT_TAG_COLOR`].
    pub fn new(name: impl Into<String>, color: Option<&str>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            color: normalize_color(color),
        }
    }
}

impl Validate for NewTag {
    const RULES: &'static [FieldRule] = TAG_RULES;

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "name" => FieldValue::Text(Some(&self.name)),
            _ => FieldValue::Text(None),
        }
    }
}

#[must_use]
pub fn normalize_color(color: Option<&str>) -> String {
    match color.map(str::trim) {
        Some(c)
            if c.len() == 7
                && c.starts_with('#')
                && c[1..].chars().all(|ch| ch.is_ascii_hexdigit()) =>
        {
            c.to_string()
        }
        _ => DEFAULT_TAG_COLOR.to_string(),
    }
}
