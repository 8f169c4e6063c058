//! Schema creation and migration behavior on fresh and legacy stores.

use recipebox::config::StoreConfig;
use recipebox::db::migrator::{BASE_MIGRATION, Migrator, add_column_if_missing};
use recipebox::domain::RecipeId;
use recipebox::{CatalogService, SchemaStatus, SeaOrmCatalogService, Store};
use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::prelude::*;

async fn open_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("recipebox-schema-test-{}.db", uuid::Uuid::new_v4()));

    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open store")
}

async fn column_count(store: &Store, table: &str, column: &str) -> i64 {
    let backend = store.conn.get_database_backend();
    let row = store
        .conn
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT COUNT(*) AS n FROM pragma_table_info(?) WHERE name = ?",
            [table.into(), column.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "n").unwrap()
}

#[tokio::test]
async fn ensure_schema_is_idempotent() {
    let store = open_store().await;

    assert_eq!(store.ensure_schema().await.unwrap(), SchemaStatus::Ready);
    assert_eq!(store.ensure_schema().await.unwrap(), SchemaStatus::Ready);

    let applied = Migrator::get_applied_migrations(&store.conn).await.unwrap();
    assert_eq!(applied.len(), Migrator::migrations().len());
    assert_eq!(applied[0].name(), BASE_MIGRATION);

    assert_eq!(column_count(&store, "tags", "color").await, 1);
    assert_eq!(column_count(&store, "recipes", "serving_unit").await, 1);
    store.ping().await.unwrap();
}

#[tokio::test]
async fn legacy_amount_column_is_rebuilt() {
    let store = open_store().await;
    store
        .conn
        .execute_unprepared(
            "CREATE TABLE recipe_ingredients (
                recipe_id INTEGER NOT NULL,
                ingredient_id INTEGER NOT NULL,
                amount TEXT,
                PRIMARY KEY (recipe_id, ingredient_id)
            );
            INSERT INTO recipe_ingredients VALUES (1, 1, '2 cups');",
        )
        .await
        .unwrap();

    assert_eq!(store.ensure_schema().await.unwrap(), SchemaStatus::Ready);

    assert_eq!(column_count(&store, "recipe_ingredients", "amount").await, 0);
    assert_eq!(column_count(&store, "recipe_ingredients", "quantity").await, 1);
    assert_eq!(column_count(&store, "recipe_ingredients", "unit").await, 1);

    // The rebuilt link table is usable.
    let catalog = SeaOrmCatalogService::new(store.clone(), &StoreConfig::default());
    let owner = catalog
        .create_user("anna", "anna@example.org", "hash")
        .await
        .unwrap();
    let flour = catalog.create_ingredient("Flour").await.unwrap().id();
    let recipe = catalog
        .create_recipe(
            recipebox::models::RecipeFields {
                title: "Bread".to_string(),
                description: None,
                instructions: "Knead and bake.".to_string(),
                prep_time: 30,
                cook_time: 40,
                servings: 8,
                serving_unit: Some("slices".to_string()),
            },
            owner,
        )
        .await
        .unwrap();
    catalog
        .link_ingredient(recipe, flour, 500.0, "g", owner)
        .await
        .unwrap();
    assert_eq!(catalog.get_recipe(recipe).await.unwrap().ingredients.len(), 1);
}

#[tokio::test]
async fn legacy_recipes_gain_serving_unit_and_keep_rows() {
    let store = open_store().await;
    store
        .conn
        .execute_unprepared(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE recipes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                instructions TEXT NOT NULL,
                prep_time INTEGER NOT NULL,
                cook_time INTEGER NOT NULL,
                servings INTEGER NOT NULL,
                created_by INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            );
            INSERT INTO users (username, email, password_hash, created_at)
                VALUES ('old_chef', 'old@example.org', 'x', '2024-01-01T00:00:00.000000Z');
            INSERT INTO recipes
                (title, description, instructions, prep_time, cook_time, servings, created_by, created_at)
                VALUES ('Old Soup', NULL, 'Boil.', 5, 30, 4, 1, '2024-01-01T00:00:00.000000Z');",
        )
        .await
        .unwrap();

    assert_eq!(store.ensure_schema().await.unwrap(), SchemaStatus::Ready);

    let catalog = SeaOrmCatalogService::new(store.clone(), &StoreConfig::default());
    let recipe = catalog.get_recipe(RecipeId::new(1)).await.unwrap();
    assert_eq!(recipe.title, "Old Soup");
    assert_eq!(recipe.serving_unit, "people");
    assert_eq!(recipe.author, "old_chef");
}

#[tokio::test]
async fn add_column_if_missing_only_adds_once() {
    let store = open_store().await;
    store.ensure_schema().await.unwrap();
    let manager = SchemaManager::new(&store.conn);

    let existing = ColumnDef::new(Alias::new("title")).string().to_owned();
    assert!(!add_column_if_missing(&manager, "recipes", "title", existing).await.unwrap());

    let notes = || {
        ColumnDef::new(Alias::new("notes"))
            .string()
            .not_null()
            .default("")
            .to_owned()
    };
    assert!(add_column_if_missing(&manager, "recipes", "notes", notes()).await.unwrap());
    assert!(!add_column_if_missing(&manager, "recipes", "notes", notes()).await.unwrap());
    assert_eq!(column_count(&store, "recipes", "notes").await, 1);
}

#[tokio::test]
async fn image_column_step_rolls_back_both_columns() {
    let store = open_store().await;
    store.ensure_schema().await.unwrap();

    Migrator::down(&store.conn, Some(1)).await.unwrap();
    assert_eq!(column_count(&store, "recipe_images", "caption").await, 0);
    assert_eq!(column_count(&store, "recipe_images", "display_order").await, 0);

    assert_eq!(store.ensure_schema().await.unwrap(), SchemaStatus::Ready);
    assert_eq!(column_count(&store, "recipe_images", "caption").await, 1);
    assert_eq!(column_count(&store, "recipe_images", "display_order").await, 1);

    let backend = store.conn.get_database_backend();
    let index = store
        .conn
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM sqlite_master \
             WHERE type = 'index' AND name = 'idx_recipe_images_recipe'",
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(index.try_get::<i64>("", "n").unwrap(), 1);
}

#[tokio::test]
async fn failed_base_schema_is_fatal() {
    let store = open_store().await;
    // A view cannot be indexed, so the base step fails part way.
    store
        .conn
        .execute_unprepared("CREATE VIEW recipe_images AS SELECT 1 AS id")
        .await
        .unwrap();

    assert!(store.ensure_schema().await.is_err());
}

#[tokio::test]
async fn failed_additive_step_degrades_and_retries() {
    let store = open_store().await;
    // A view cannot be altered, so only the tag color step fails.
    store
        .conn
        .execute_unprepared("CREATE VIEW tags AS SELECT 1 AS id, 'Legacy' AS name")
        .await
        .unwrap();

    let status = store.ensure_schema().await.unwrap();
    assert!(matches!(status, SchemaStatus::Degraded(_)));
    assert!(!status.is_ready());

    let applied = Migrator::get_applied_migrations(&store.conn).await.unwrap();
    assert!(applied.iter().any(|m| m.name() == BASE_MIGRATION));
    assert!(applied.len() < Migrator::migrations().len());

    // Still pending, so the next boot tries again.
    assert!(matches!(
        store.ensure_schema().await.unwrap(),
        SchemaStatus::Degraded(_)
    ));

    // Everything not touching tags keeps working.
    let catalog = SeaOrmCatalogService::new(store.clone(), &StoreConfig::default());
    catalog
        .create_user("anna", "anna@example.org", "hash")
        .await
        .unwrap();
    assert!(catalog.create_ingredient("Flour").await.unwrap().was_created());
}
