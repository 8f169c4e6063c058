//! Strongly typed identifiers for catalog entities.
//!
//! Every table uses an integer primary key. Wrapping each one in its own
//! newtype keeps a `TagId` from being passed where a `RecipeId` is expected.
//!
//! # Examples
//!
//! ```rust
//! use recipebox::domain::RecipeId;
//!
//! let id = RecipeId::new(42);
//! assert_eq!(id.value(), 42);
//! assert_eq!(id.to_string(), "42");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wraps a raw row id.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Returns the underlying row id.
            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered user.
    UserId
);
entity_id!(
    /// Identifier of a recipe row.
    RecipeId
);
entity_id!(
    /// Identifier of a shared ingredient.
    IngredientId
);
entity_id!(
    /// Identifier of a shared tag.
    TagId
);
entity_id!(
    /// Identifier of a recipe image row.
    ImageId
);
