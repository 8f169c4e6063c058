use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{GeneralConfig, SeedConfig};
use crate::domain::{ImageId, IngredientId, RecipeId, TagId, UserId};
use crate::models::recipe::RecipeRow;
use crate::models::{
    Ingredient, IngredientLink, NewImage, NewIngredient, NewRecipe, NewTag, NewUser,
    RecipeFields, RecipeImage, RecipeIngredient, ReferenceOutcome, Tag, User,
};
use crate::validation::validate;

pub mod migrator;
pub mod repositories;

pub use repositories::ingredient::DeleteOutcome;
pub use repositories::recipe::like_pattern;

const PINNED_CONNECTION_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Connection pool bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
        }
    }
}

impl From<&GeneralConfig> for PoolSettings {
    fn from(general: &GeneralConfig) -> Self {
        Self {
            max_connections: general.max_db_connections,
            min_connections: general.min_db_connections,
        }
    }
}

/// Outcome of [`Store::ensure_schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    Ready,
    /// The base tables exist but a later migration failed. It is retried on
    /// the next boot.
    Degraded(String),
}

impl SchemaStatus {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Counts of reference rows created by [`Store::seed_reference_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub ingredients_created: usize,
    pub tags_created: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::open(db_url, PoolSettings::default()).await
    }

    /// Opens a pool against `db_url`. File databases get their parent
    /// directory and file created. The schema is not touched; call
    /// [`Store::ensure_schema`] before serving.
    pub async fn open(db_url: &str, pool: PoolSettings) -> Result<Self> {
        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path = file_path(db_url);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !path.exists() {
                std::fs::File::create(path)
                    .with_context(|| format!("Failed to create database file {}", path.display()))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if in_memory {
            // Every connection to `:memory:` is its own database, and it is
            // gone once that connection is recycled.
            opt.max_connections(1)
                .min_connections(1)
                .idle_timeout(PINNED_CONNECTION_LIFETIME)
                .max_lifetime(PINNED_CONNECTION_LIFETIME);
        } else {
            opt.max_connections(pool.max_connections)
                .min_connections(pool.min_connections)
                .idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt)
            .await
            .with_context(|| format!("Failed to connect to {db_url}"))?;

        info!(
            "Database connected (pool: {}-{})",
            pool.min_connections, pool.max_connections
        );

        Ok(Self { conn })
    }

    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .context("Failed to close database")?;
        info!("Database closed");
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Applies pending migrations.
    ///
    /// Fails when the base tables could not be created. Failures in later
    /// steps are logged and reported as [`SchemaStatus::Degraded`].
    pub async fn ensure_schema(&self) -> Result<SchemaStatus> {
        let Err(err) = migrator::Migrator::up(&self.conn, None).await else {
            info!("Schema up to date");
            return Ok(SchemaStatus::Ready);
        };

        let applied = migrator::Migrator::get_applied_migrations(&self.conn)
            .await
            .context("Failed to read migration history")?;

        if applied
            .iter()
            .any(|m| m.name() == migrator::BASE_MIGRATION)
        {
            warn!(error = %err, "Schema migration failed, starting with base schema");
            Ok(SchemaStatus::Degraded(err.to_string()))
        } else {
            Err(anyhow::Error::new(err).context("Failed to create catalog schema"))
        }
    }

    /// Inserts configured ingredients and tags that are not there yet.
    /// Invalid entries are skipped with a warning.
    pub async fn seed_reference_data(&self, seed: &SeedConfig) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        for name in &seed.ingredients {
            let input = NewIngredient::new(name.as_str());
            if let Err(e) = validate(&input) {
                warn!("Skipping seed ingredient {:?}: {}", name, e);
                report.skipped += 1;
                continue;
            }
            if self.create_ingredient(&input.name).await?.was_created() {
                report.ingredients_created += 1;
            }
        }

        for tag in &seed.tags {
            let input = NewTag::new(tag.name.as_str(), tag.color.as_deref());
            if let Err(e) = validate(&input) {
                warn!("Skipping seed tag {:?}: {}", tag.name, e);
                report.skipped += 1;
                continue;
            }
            if self.create_tag(&input).await?.was_created() {
                report.tags_created += 1;
            }
        }

        info!(
            "Reference data seeded ({} ingredients, {} tags created)",
            report.ingredients_created, report.tags_created
        );
        Ok(report)
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn ingredient_repo(&self) -> repositories::ingredient::IngredientRepository {
        repositories::ingredient::IngredientRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> repositories::tag::TagRepository {
        repositories::tag::TagRepository::new(self.conn.clone())
    }

    fn image_repo(&self) -> repositories::image::ImageRepository {
        repositories::image::ImageRepository::new(self.conn.clone())
    }

    // Users

    pub async fn create_user(&self, user: &NewUser) -> Result<UserId> {
        self.user_repo().create(user).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_with_password(&self, username: &str) -> Result<Option<(User, String)>> {
        self.user_repo()
            .get_by_username_with_password(username)
            .await
    }

    // Recipes

    pub async fn insert_recipe(&self, fields: &RecipeFields, owner: UserId) -> Result<RecipeId> {
        self.recipe_repo().insert(fields, owner).await
    }

    pub async fn insert_recipe_with_children(
        &self,
        recipe: &NewRecipe,
        owner: UserId,
    ) -> Result<RecipeId> {
        self.recipe_repo().insert_with_children(recipe, owner).await
    }

    pub async fn update_recipe_owned(
        &self,
        id: RecipeId,
        fields: &RecipeFields,
        caller: UserId,
    ) -> Result<bool> {
        self.recipe_repo().update_owned(id, fields, caller).await
    }

    pub async fn delete_recipe_owned(&self, id: RecipeId, caller: UserId) -> Result<bool> {
        self.recipe_repo().delete_owned(id, caller).await
    }

    pub async fn recipe_owner(&self, id: RecipeId) -> Result<Option<UserId>> {
        self.recipe_repo().owner_of(id).await
    }

    pub async fn recipe_row(&self, id: RecipeId) -> Result<Option<RecipeRow>> {
        self.recipe_repo().find_row(id).await
    }

    pub async fn list_recipe_rows(&self) -> Result<Vec<RecipeRow>> {
        self.recipe_repo().list_rows().await
    }

    pub async fn list_recipe_rows_by_tag(&self, tag_id: TagId) -> Result<Vec<RecipeRow>> {
        self.recipe_repo().list_rows_by_tag(tag_id).await
    }

    pub async fn list_recipe_rows_by_owner(&self, owner: UserId) -> Result<Vec<RecipeRow>> {
        self.recipe_repo().list_rows_by_owner(owner).await
    }

    pub async fn search_recipe_rows(&self, pattern: &str) -> Result<Vec<RecipeRow>> {
        self.recipe_repo().search_rows(pattern).await
    }

    // Ingredients

    pub async fn create_ingredient(&self, name: &str) -> Result<ReferenceOutcome<IngredientId>> {
        self.ingredient_repo().create(name).await
    }

    pub async fn delete_ingredient(&self, id: IngredientId) -> Result<DeleteOutcome> {
        self.ingredient_repo().delete(id).await
    }

    pub async fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        self.ingredient_repo().list().await
    }

    pub async fn recipe_ingredients(&self, recipe_id: RecipeId) -> Result<Vec<RecipeIngredient>> {
        self.ingredient_repo().links_for_recipe(recipe_id).await
    }

    pub async fn link_ingredient_owned(
        &self,
        recipe_id: RecipeId,
        link: &IngredientLink,
        caller: UserId,
    ) -> Result<bool> {
        self.ingredient_repo()
            .link_owned(recipe_id, link, caller)
            .await
    }

    pub async fn unlink_ingredient_owned(
        &self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
        caller: UserId,
    ) -> Result<bool> {
        self.ingredient_repo()
            .unlink_owned(recipe_id, ingredient_id, caller)
            .await
    }

    // Tags

    pub async fn create_tag(&self, tag: &NewTag) -> Result<ReferenceOutcome<TagId>> {
        self.tag_repo().create(tag).await
    }

    pub async fn delete_tag(&self, id: TagId) -> Result<bool> {
        self.tag_repo().delete(id).await
    }

    pub async fn get_tag(&self, id: TagId) -> Result<Option<Tag>> {
        self.tag_repo().get(id).await
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.tag_repo().list().await
    }

    pub async fn recipe_tags(&self, recipe_id: RecipeId) -> Result<Vec<Tag>> {
        self.tag_repo().for_recipe(recipe_id).await
    }

    pub async fn link_tag_owned(
        &self,
        recipe_id: RecipeId,
        tag_id: TagId,
        caller: UserId,
    ) -> Result<bool> {
        self.tag_repo().link_owned(recipe_id, tag_id, caller).await
    }

    pub async fn unlink_tag_owned(
        &self,
        recipe_id: RecipeId,
        tag_id: TagId,
        caller: UserId,
    ) -> Result<bool> {
        self.tag_repo().unlink_owned(recipe_id, tag_id, caller).await
    }

    // Images

    pub async fn recipe_images(&self, recipe_id: RecipeId) -> Result<Vec<RecipeImage>> {
        self.image_repo().for_recipe(recipe_id).await
    }

    pub async fn add_image_owned(
        &self,
        recipe_id: RecipeId,
        image: &NewImage,
        caller: UserId,
    ) -> Result<Option<ImageId>> {
        self.image_repo().add_owned(recipe_id, image, caller).await
    }

    pub async fn remove_image_owned(&self, id: ImageId, caller: UserId) -> Result<bool> {
        self.image_repo().remove_owned(id, caller).await
    }
}

/// Filesystem path of a `sqlite:` URL, without scheme or query string.
fn file_path(db_url: &str) -> &Path {
    let rest = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))
        .unwrap_or(db_url);
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    Path::new(path)
}
