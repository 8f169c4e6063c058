use super::{open_catalog, print_recipe_line};
use crate::config::Config;
use crate::services::CatalogService;

pub async fn cmd_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let catalog = open_catalog(config).await?;
    let results = catalog.search_recipes(query).await?;

    if results.is_empty() {
        println!("No recipes found matching '{query}'");
        return Ok(());
    }

    println!("Search Results for '{query}':");
    println!("{:-<60}", "");

    for recipe in &results {
        print_recipe_line(recipe);
        println!();
    }

    Ok(())
}
