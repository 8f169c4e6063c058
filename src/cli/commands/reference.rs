use super::open_catalog;
use crate::config::Config;
use crate::services::CatalogService;

pub async fn cmd_ingredients(config: &Config) -> anyhow::Result<()> {
    let catalog = open_catalog(config).await?;
    let ingredients = catalog.list_ingredients().await?;

    if ingredients.is_empty() {
        println!("No ingredients yet. Run: recipebox migrate");
        return Ok(());
    }

    println!("Ingredients ({} total)", ingredients.len());
    println!("{:-<40}", "");
    for ingredient in ingredients {
        println!("{:>5}  {}", ingredient.id.value(), ingredient.name);
    }

    Ok(())
}

pub async fn cmd_tags(config: &Config) -> anyhow::Result<()> {
    let catalog = open_catalog(config).await?;
    let tags = catalog.list_tags().await?;

    if tags.is_empty() {
        println!("No tags yet. Run: recipebox migrate");
        return Ok(());
    }

    println!("Tags ({} total)", tags.len());
    println!("{:-<40}", "");
    for tag in tags {
        println!("{:>5}  {}  {}", tag.id.value(), tag.color, tag.name);
    }

    Ok(())
}
