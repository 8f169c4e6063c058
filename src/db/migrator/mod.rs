//! Versioned schema migrations.
//!
//! Steps run in the order listed in [`Migrator::migrations`] and are recorded
//! in `seaql_migrations`, so every boot only applies what is missing.

use sea_orm_migration::prelude::*;
use tracing::info;

mod m20250301_create_catalog_tables;
mod m20250315_drop_legacy_ingredient_amount;
mod m20250402_add_serving_unit;
mod m20250410_add_tag_color;
mod m20250418_add_image_caption;

/// Name of the step that creates the base tables. A store without it
/// recorded has no usable schema.
pub const BASE_MIGRATION: &str = "m20250301_create_catalog_tables";

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_create_catalog_tables::Migration),
            Box::new(m20250315_drop_legacy_ingredient_amount::Migration),
            Box::new(m20250402_add_serving_unit::Migration),
            Box::new(m20250410_add_tag_color::Migration),
            Box::new(m20250418_add_image_caption::Migration),
        ]
    }
}

/// Adds `column` to `table` unless it is already there.
///
/// Returns `true` when the column was added. Databases created before the
/// migration history existed may be missing columns the entities declare;
/// this is how such stores catch up without losing rows.
pub async fn add_column_if_missing(
    manager: &SchemaManager<'_>,
    table: &str,
    column: &str,
    mut definition: ColumnDef,
) -> Result<bool, DbErr> {
    if manager.has_column(table, column).await? {
        return Ok(false);
    }

    manager
        .alter_table(
            Table::alter()
                .table(Alias::new(table))
                .add_column(&mut definition)
                .to_owned(),
        )
        .await?;

    info!("Added column {}.{}", table, column);
    Ok(true)
}
