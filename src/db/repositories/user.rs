use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;

use crate::domain::UserId;
use crate::entities::{prelude::*, users};
use crate::models::{NewUser, User, timestamp_now};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a user. Duplicate usernames or emails surface as a unique
    /// constraint violation from the database.
    pub async fn create(&self, user: &NewUser) -> Result<UserId> {
        let active_model = users::ActiveModel {
            username: Set(user.username.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            created_at: Set(timestamp_now()),
            ..Default::default()
        };

        let res = Users::insert(active_model)
            .exec(&self.conn)
            .await
            .context("Failed to insert user")?;

        info!("Created user {} ({})", user.username, res.last_insert_id);
        Ok(UserId::new(res.last_insert_id))
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Get user by username together with the stored password hash
    pub async fn get_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }
}
