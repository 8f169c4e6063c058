mod init;
mod list;
mod migrate;
mod reference;
mod search;
mod show;

pub use init::cmd_init;
pub use list::cmd_list;
pub use migrate::cmd_migrate;
pub use reference::{cmd_ingredients, cmd_tags};
pub use search::cmd_search;
pub use show::cmd_show;

use crate::config::Config;
use crate::db::{PoolSettings, SchemaStatus, Store};
use crate::models::Recipe;
use crate::services::SeaOrmCatalogService;
use tracing::warn;

/// Opens the configured store, brings the schema up to date and wraps it in
/// a catalog service.
async fn open_catalog(config: &Config) -> anyhow::Result<SeaOrmCatalogService> {
    let store = Store::open(
        &config.general.database_path,
        PoolSettings::from(&config.general),
    )
    .await?;

    if let SchemaStatus::Degraded(reason) = store.ensure_schema().await? {
        warn!("Schema is degraded: {}", reason);
    }

    Ok(SeaOrmCatalogService::new(store, &config.store))
}

fn print_recipe_line(recipe: &Recipe) {
    let total = recipe.prep_time + recipe.cook_time;
    println!("• {} (by {})", recipe.title, recipe.author);
    println!(
        "  ID: {} | {} min | Serves {} {}",
        recipe.id, total, recipe.servings, recipe.serving_unit
    );
    if !recipe.tags.is_empty() {
        let tags: Vec<&str> = recipe.tags.iter().map(|t| t.name.as_str()).collect();
        println!("  Tags: {}", tags.join(", "));
    }
    if !recipe.is_complete() {
        let missing: Vec<&str> = recipe.degraded.iter().map(|c| c.as_str()).collect();
        println!("  (incomplete: {} unavailable)", missing.join(", "));
    }
}
