//! List recipes command handler

use super::{open_catalog, print_recipe_line};
use crate::config::Config;
use crate::domain::TagId;
use crate::services::CatalogService;

pub async fn cmd_list(config: &Config, tag: Option<i32>) -> anyhow::Result<()> {
    let catalog = open_catalog(config).await?;

    let recipes = match tag {
        Some(id) => {
            let tag = catalog.get_tag(TagId::new(id)).await?;
            println!("Recipes tagged '{}'", tag.name);
            catalog.list_recipes_by_tag(tag.id).await?
        }
        None => catalog.list_all_recipes().await?,
    };

    if recipes.is_empty() {
        println!("No recipes yet.");
        return Ok(());
    }

    println!("Recipes ({} total)", recipes.len());
    println!("{:-<70}", "");

    for recipe in &recipes {
        print_recipe_line(recipe);
    }

    Ok(())
}
