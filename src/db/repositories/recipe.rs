use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Query, SelectStatement};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ExecResult,
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    Statement, TransactionTrait, Value,
};
use tracing::info;

use crate::domain::{RecipeId, TagId, UserId};
use crate::entities::{prelude::*, recipe_tags, recipes, users};
use crate::models::recipe::RecipeRow;
use crate::models::{NewRecipe, RecipeFields, timestamp_now};

use super::{image, ingredient, tag};

/// Five-field substring match. Every `?` binds the same escaped pattern;
/// the last one drives the title-first ranking.
const SEARCH_SQL: &str = r"
SELECT r.id, r.title, r.description, r.instructions, r.prep_time, r.cook_time,
       r.servings, r.serving_unit, r.created_by, r.created_at, u.username AS author
FROM recipes r
JOIN users u ON u.id = r.created_by
LEFT JOIN recipe_ingredients ri ON ri.recipe_id = r.id
LEFT JOIN ingredients i ON i.id = ri.ingredient_id
LEFT JOIN recipe_tags rt ON rt.recipe_id = r.id
LEFT JOIN tags t ON t.id = rt.tag_id
WHERE r.title LIKE ? ESCAPE '\'
   OR r.description LIKE ? ESCAPE '\'
   OR r.instructions LIKE ? ESCAPE '\'
   OR i.name LIKE ? ESCAPE '\'
   OR t.name LIKE ? ESCAPE '\'
ORDER BY CASE WHEN r.title LIKE ? ESCAPE '\' THEN 0 ELSE 1 END,
         r.created_at DESC,
         r.id DESC
";

const SEARCH_BINDS: usize = 6;

/// Repository for recipe base rows
pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Recipes joined with the owner's username, exposed as `author`.
    fn rows() -> Select<Recipes> {
        Recipes::find()
            .column_as(users::Column::Username, "author")
            .join(JoinType::InnerJoin, recipes::Relation::Users.def())
    }

    pub async fn insert(&self, fields: &RecipeFields, owner: UserId) -> Result<RecipeId> {
        let id = insert_base(&self.conn, fields, owner).await?;
        info!("Created recipe {} for user {}", id, owner);
        Ok(id)
    }

    /// Inserts the base row and all children in one transaction. Any failing
    /// child insert rolls the whole recipe back.
    pub async fn insert_with_children(&self, recipe: &NewRecipe, owner: UserId) -> Result<RecipeId> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin recipe transaction")?;

        let id = insert_base(&txn, &recipe.fields, owner).await?;

        for link in &recipe.ingredients {
            ingredient::upsert_link(&txn, id, link).await?;
        }
        for tag_id in &recipe.tag_ids {
            tag::insert_link(&txn, id, *tag_id).await?;
        }
        for new_image in &recipe.images {
            image::insert(&txn, id, new_image).await?;
        }

        txn.commit()
            .await
            .context("Failed to commit recipe transaction")?;

        info!(
            "Created recipe {} for user {} ({} ingredients, {} tags, {} images)",
            id,
            owner,
            recipe.ingredients.len(),
            recipe.tag_ids.len(),
            recipe.images.len()
        );
        Ok(id)
    }

    /// Replaces the scalar fields. Returns `false` when no recipe with this id
    /// is owned by `caller`.
    pub async fn update_owned(
        &self,
        id: RecipeId,
        fields: &RecipeFields,
        caller: UserId,
    ) -> Result<bool> {
        let result = Recipes::update_many()
            .col_expr(recipes::Column::Title, Expr::value(fields.title.clone()))
            .col_expr(
                recipes::Column::Description,
                Expr::value(fields.description.clone()),
            )
            .col_expr(
                recipes::Column::Instructions,
                Expr::value(fields.instructions.clone()),
            )
            .col_expr(recipes::Column::PrepTime, Expr::value(fields.prep_time))
            .col_expr(recipes::Column::CookTime, Expr::value(fields.cook_time))
            .col_expr(recipes::Column::Servings, Expr::value(fields.servings))
            .col_expr(
                recipes::Column::ServingUnit,
                Expr::value(fields.serving_unit_or_default().to_string()),
            )
            .filter(recipes::Column::Id.eq(id.value()))
            .filter(recipes::Column::CreatedBy.eq(caller.value()))
            .exec(&self.conn)
            .await
            .context("Failed to update recipe")?;

        let updated = result.rows_affected > 0;
        if updated {
            info!("Updated recipe {}", id);
        }
        Ok(updated)
    }

    /// Deletes a recipe owned by `caller`; child rows go with it through the
    /// foreign key cascades.
    pub async fn delete_owned(&self, id: RecipeId, caller: UserId) -> Result<bool> {
        let result = Recipes::delete_many()
            .filter(recipes::Column::Id.eq(id.value()))
            .filter(recipes::Column::CreatedBy.eq(caller.value()))
            .exec(&self.conn)
            .await
            .context("Failed to delete recipe")?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Deleted recipe {}", id);
        }
        Ok(removed)
    }

    pub async fn owner_of(&self, id: RecipeId) -> Result<Option<UserId>> {
        owner_of(&self.conn, id).await
    }

    pub async fn find_row(&self, id: RecipeId) -> Result<Option<RecipeRow>> {
        Self::rows()
            .filter(recipes::Column::Id.eq(id.value()))
            .into_model::<RecipeRow>()
            .one(&self.conn)
            .await
            .context("Failed to query recipe")
    }

    pub async fn list_rows(&self) -> Result<Vec<RecipeRow>> {
        Self::rows()
            .order_by_desc(recipes::Column::CreatedAt)
            .order_by_desc(recipes::Column::Id)
            .into_model::<RecipeRow>()
            .all(&self.conn)
            .await
            .context("Failed to list recipes")
    }

    pub async fn list_rows_by_tag(&self, tag_id: TagId) -> Result<Vec<RecipeRow>> {
        Self::rows()
            .join(JoinType::InnerJoin, recipes::Relation::RecipeTags.def())
            .filter(recipe_tags::Column::TagId.eq(tag_id.value()))
            .order_by_desc(recipes::Column::CreatedAt)
            .order_by_desc(recipes::Column::Id)
            .into_model::<RecipeRow>()
            .all(&self.conn)
            .await
            .context("Failed to list recipes by tag")
    }

    pub async fn list_rows_by_owner(&self, owner: UserId) -> Result<Vec<RecipeRow>> {
        Self::rows()
            .filter(recipes::Column::CreatedBy.eq(owner.value()))
            .order_by_desc(recipes::Column::CreatedAt)
            .order_by_desc(recipes::Column::Id)
            .into_model::<RecipeRow>()
            .all(&self.conn)
            .await
            .context("Failed to list recipes by owner")
    }

    /// Raw search rows, title matches first, newest first within a group.
    /// A recipe appears once per matching ingredient/tag combination.
    pub async fn search_rows(&self, pattern: &str) -> Result<Vec<RecipeRow>> {
        let backend = self.conn.get_database_backend();
        let values = vec![sea_orm::Value::from(pattern.to_string()); SEARCH_BINDS];
        let stmt = Statement::from_sql_and_values(backend, SEARCH_SQL, values);

        RecipeRow::find_by_statement(stmt)
            .all(&self.conn)
            .await
            .context("Failed to search recipes")
    }
}

async fn insert_base<C: ConnectionTrait>(
    conn: &C,
    fields: &RecipeFields,
    owner: UserId,
) -> Result<RecipeId> {
    let active_model = recipes::ActiveModel {
        title: Set(fields.title.clone()),
        description: Set(fields.description.clone()),
        instructions: Set(fields.instructions.clone()),
        prep_time: Set(fields.prep_time),
        cook_time: Set(fields.cook_time),
        servings: Set(fields.servings),
        serving_unit: Set(fields.serving_unit_or_default().to_string()),
        created_by: Set(owner.value()),
        created_at: Set(timestamp_now()),
        ..Default::default()
    };

    let res = Recipes::insert(active_model)
        .exec(conn)
        .await
        .context("Failed to insert recipe")?;

    Ok(RecipeId::new(res.last_insert_id))
}

pub(crate) async fn owner_of<C: ConnectionTrait>(conn: &C, id: RecipeId) -> Result<Option<UserId>> {
    let owner = Recipes::find_by_id(id.value())
        .select_only()
        .column(recipes::Column::CreatedBy)
        .into_tuple::<i32>()
        .one(conn)
        .await
        .context("Failed to query recipe owner")?;

    Ok(owner.map(UserId::new))
}

/// `SELECT id FROM recipes WHERE created_by = ?`, for ownership-scoped
/// statements on child tables.
pub(crate) fn owned_recipe_ids(owner: UserId) -> SelectStatement {
    Query::select()
        .column(recipes::Column::Id)
        .from(Recipes)
        .and_where(recipes::Column::CreatedBy.eq(owner.value()))
        .to_owned()
}

/// Ownership guard appended to child-table `INSERT ... SELECT` statements.
/// Binds the recipe id, then the caller.
const OWNED_RECIPE_GUARD: &str =
    "WHERE EXISTS (SELECT 1 FROM recipes WHERE id = ? AND created_by = ?)";

/// Runs `insert` (an `INSERT ... SELECT` without `FROM`) only if `caller`
/// owns `recipe_id`, followed by the optional `on_conflict` clause. The
/// ownership check and the write are one statement, so no read lock is held
/// while waiting for the write lock. Zero affected rows means the recipe is
/// missing or not owned, unless `on_conflict` skipped the row.
pub(crate) async fn exec_if_owned<C: ConnectionTrait>(
    conn: &C,
    insert: &str,
    on_conflict: &str,
    mut values: Vec<Value>,
    recipe_id: RecipeId,
    caller: UserId,
) -> Result<ExecResult, DbErr> {
    values.push(recipe_id.value().into());
    values.push(caller.value().into());

    let sql = format!("{insert} {OWNED_RECIPE_GUARD} {on_conflict}");
    let stmt = Statement::from_sql_and_values(conn.get_database_backend(), sql, values);
    conn.execute(stmt).await
}

/// Escapes LIKE wildcards in `term` and wraps it as `%term%`.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
