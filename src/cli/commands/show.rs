//! Show recipe command handler

use super::open_catalog;
use crate::config::Config;
use crate::domain::RecipeId;
use crate::services::CatalogService;

pub async fn cmd_show(config: &Config, id: i32, json: bool) -> anyhow::Result<()> {
    let catalog = open_catalog(config).await?;
    let recipe = catalog.get_recipe(RecipeId::new(id)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
        return Ok(());
    }

    println!("{}", recipe.title);
    println!("{:=<60}", "");
    println!("By {} on {}", recipe.author, recipe.created_at);
    println!(
        "Prep {} min | Cook {} min | Serves {} {}",
        recipe.prep_time, recipe.cook_time, recipe.servings, recipe.serving_unit
    );

    if let Some(description) = &recipe.description {
        println!();
        println!("{description}");
    }

    println!();
    println!("Ingredients:");
    if recipe.ingredients.is_empty() {
        println!("  (none)");
    }
    for item in &recipe.ingredients {
        println!("  - {} {} {}", item.quantity, item.unit, item.name);
    }

    println!();
    println!("Instructions:");
    println!("{}", recipe.instructions);

    if !recipe.tags.is_empty() {
        let tags: Vec<String> = recipe
            .tags
            .iter()
            .map(|t| format!("{} ({})", t.name, t.color))
            .collect();
        println!();
        println!("Tags: {}", tags.join(", "));
    }

    if !recipe.images.is_empty() {
        println!();
        println!("Images:");
        for image in &recipe.images {
            match &image.caption {
                Some(caption) => println!("  [{}] {} - {}", image.display_order, image.filename, caption),
                None => println!("  [{}] {}", image.display_order, image.filename),
            }
        }
    }

    for collection in &recipe.degraded {
        println!();
        println!("Warning: {collection} could not be loaded and are shown empty.");
    }

    Ok(())
}
