use crate::domain::UserId;
use crate::entities::users;
use crate::validation::{FieldRule, FieldValue, USER_RULES, Validate};
use serde::{Deserialize, Serialize};

/// A registered user, without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            username: model.username,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into().trim().to_string(),
            email: email.into().trim().to_string(),
            password_hash: password_hash.into(),
        }
    }
}

impl Validate for NewUser {
    const RULES: &'static [FieldRule] = USER_RULES;

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "username" => FieldValue::Text(Some(&self.username)),
            "email" => FieldValue::Text(Some(&self.email)),
            "password_hash" => FieldValue::Text(Some(&self.password_hash)),
            _ => FieldValue::Text(None),
        }
    }
}
