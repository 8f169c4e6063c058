//! Ranked free-text search.

use recipebox::config::StoreConfig;
use recipebox::domain::UserId;
use recipebox::models::{Recipe, RecipeFields};
use recipebox::{CatalogError, CatalogService, SchemaStatus, SeaOrmCatalogService, Store};

async fn setup_with(config: &StoreConfig) -> SeaOrmCatalogService {
    let db_path =
        std::env::temp_dir().join(format!("recipebox-search-test-{}.db", uuid::Uuid::new_v4()));

    let store = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open store");
    assert_eq!(
        store.ensure_schema().await.expect("schema"),
        SchemaStatus::Ready
    );

    SeaOrmCatalogService::new(store, config)
}

async fn setup() -> (SeaOrmCatalogService, UserId) {
    let catalog = setup_with(&StoreConfig::default()).await;
    let owner = catalog
        .create_user("anna", "anna@example.org", "hash")
        .await
        .unwrap();
    (catalog, owner)
}

fn fields(title: &str, description: Option<&str>, instructions: &str) -> RecipeFields {
    RecipeFields {
        title: title.to_string(),
        description: description.map(str::to_string),
        instructions: instructions.to_string(),
        prep_time: 10,
        cook_time: 10,
        servings: 2,
        serving_unit: None,
    }
}

fn titles(recipes: &[Recipe]) -> Vec<&str> {
    recipes.iter().map(|r| r.title.as_str()).collect()
}

fn contains_term(recipe: &Recipe, term: &str) -> bool {
    let term = term.to_lowercase();
    let has = |text: &str| text.to_lowercase().contains(&term);

    has(&recipe.title)
        || recipe.description.as_deref().is_some_and(has)
        || has(&recipe.instructions)
        || recipe.ingredients.iter().any(|i| has(&i.name))
        || recipe.tags.iter().any(|t| has(&t.name))
}

#[tokio::test]
async fn basil_finds_margherita_through_its_ingredient() {
    let (catalog, owner) = setup().await;
    let basil = catalog.create_ingredient("Basil").await.unwrap().id();

    let pizza = catalog
        .create_recipe(
            fields("Margherita Pizza", None, "Top the dough with tomatoes and bake."),
            owner,
        )
        .await
        .unwrap();
    catalog
        .link_ingredient(pizza, basil, 8.0, "leaves", owner)
        .await
        .unwrap();
    catalog
        .create_recipe(fields("Pancakes", None, "Whisk and fry."), owner)
        .await
        .unwrap();

    let results = catalog.search_recipes("basil").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, pizza);
    assert!(results[0].ingredients.iter().any(|i| i.name == "Basil"));
}

#[tokio::test]
async fn title_matches_rank_before_other_matches() {
    let (catalog, owner) = setup().await;

    let margherita = catalog
        .create_recipe(
            fields("Margherita Pizza", None, "Top the dough with tomatoes and bake."),
            owner,
        )
        .await
        .unwrap();
    // Newer, but only mentions pizza in the description.
    let bread = catalog
        .create_recipe(
            fields("Garlic Bread", Some("Perfect next to a pizza"), "Toast it."),
            owner,
        )
        .await
        .unwrap();

    let ids: Vec<_> = catalog
        .search_recipes("PIZZA")
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![margherita, bread]);
}

#[tokio::test]
async fn equal_rank_is_broken_by_recency() {
    let (catalog, owner) = setup().await;

    catalog
        .create_recipe(fields("Apple Pie", None, "Bake."), owner)
        .await
        .unwrap();
    catalog
        .create_recipe(fields("Apple Tart", None, "Bake."), owner)
        .await
        .unwrap();

    let results = catalog.search_recipes("apple").await.unwrap();
    assert_eq!(titles(&results), vec!["Apple Tart", "Apple Pie"]);
}

#[tokio::test]
async fn recipe_matching_many_ways_appears_once() {
    let (catalog, owner) = setup().await;

    let id = catalog
        .create_recipe(
            fields("Basil Pesto", Some("All the basil"), "Blend the basil."),
            owner,
        )
        .await
        .unwrap();
    for name in ["Basil", "Thai Basil", "Pine Nuts"] {
        let ingredient = catalog.create_ingredient(name).await.unwrap().id();
        catalog
            .link_ingredient(id, ingredient, 1.0, "cup", owner)
            .await
            .unwrap();
    }
    for name in ["Basil Lovers", "Green Basil", "Quick"] {
        let tag = catalog.create_tag(name, None).await.unwrap().id();
        catalog.link_tag(id, tag, owner).await.unwrap();
    }

    let results = catalog.search_recipes("basil").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].ingredients.len(), 3);
    assert_eq!(results[0].tags.len(), 3);
}

#[tokio::test]
async fn tag_names_are_searched() {
    let (catalog, owner) = setup().await;
    let id = catalog
        .create_recipe(fields("Chili", None, "Simmer slowly."), owner)
        .await
        .unwrap();
    let tag = catalog.create_tag("Comfort Food", None).await.unwrap().id();
    catalog.link_tag(id, tag, owner).await.unwrap();

    let results = catalog.search_recipes("comfort").await.unwrap();
    assert_eq!(titles(&results), vec!["Chili"]);
}

#[tokio::test]
async fn wildcards_in_the_term_match_literally() {
    let (catalog, owner) = setup().await;
    catalog
        .create_recipe(fields("100% Rye Bread", None, "Knead."), owner)
        .await
        .unwrap();
    catalog
        .create_recipe(fields("Rye Bread", None, "Knead 100 times."), owner)
        .await
        .unwrap();

    let results = catalog.search_recipes("100%").await.unwrap();
    assert_eq!(titles(&results), vec!["100% Rye Bread"]);

    assert!(catalog.search_recipes("e_d").await.unwrap().is_empty());
    assert_eq!(catalog.search_recipes("%").await.unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_queries_are_rejected() {
    let (catalog, _owner) = setup().await;

    let long = "x".repeat(101);
    for bad in ["", "   ", "tab\tinside", long.as_str()] {
        let err = catalog.search_recipes(bad).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidQuery(_)), "{bad:?}");
    }
}

#[tokio::test]
async fn results_are_capped_after_dedup() {
    let config = StoreConfig {
        search_result_limit: 2,
        ..StoreConfig::default()
    };
    let catalog = setup_with(&config).await;
    let owner = catalog
        .create_user("anna", "anna@example.org", "hash")
        .await
        .unwrap();

    let soup = catalog
        .create_recipe(fields("Soup One", None, "Boil."), owner)
        .await
        .unwrap();
    for name in ["Soup Greens", "Soup Bones"] {
        let ingredient = catalog.create_ingredient(name).await.unwrap().id();
        catalog
            .link_ingredient(soup, ingredient, 1.0, "kg", owner)
            .await
            .unwrap();
    }
    catalog
        .create_recipe(fields("Soup Two", None, "Boil."), owner)
        .await
        .unwrap();
    catalog
        .create_recipe(fields("Soup Three", None, "Boil."), owner)
        .await
        .unwrap();

    let results = catalog.search_recipes("soup").await.unwrap();
    assert_eq!(titles(&results), vec!["Soup Three", "Soup Two"]);
}

#[tokio::test]
async fn every_result_contains_the_term() {
    let (catalog, owner) = setup().await;

    let onion = catalog.create_ingredient("Red Onion").await.unwrap().id();
    let vegan = catalog.create_tag("Vegan", None).await.unwrap().id();

    let salsa = catalog
        .create_recipe(fields("Salsa", None, "Chop everything."), owner)
        .await
        .unwrap();
    catalog
        .link_ingredient(salsa, onion, 1.0, "pcs", owner)
        .await
        .unwrap();
    let curry = catalog
        .create_recipe(fields("Lentil Curry", Some("Warming and red"), "Simmer."), owner)
        .await
        .unwrap();
    catalog.link_tag(curry, vegan, owner).await.unwrap();
    catalog
        .create_recipe(fields("Onion Soup", None, "Caramelize the onions."), owner)
        .await
        .unwrap();
    catalog
        .create_recipe(fields("Toast", None, "Butter it."), owner)
        .await
        .unwrap();

    for term in ["onion", "red", "vegan", "simmer", "soup", "butter", "nothing-here"] {
        let results = catalog.search_recipes(term).await.unwrap();
        for recipe in &results {
            assert!(contains_term(recipe, term), "{term} -> {}", recipe.title);
        }
        let mut ids: Vec<_> = results.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), results.len());
    }

    assert_eq!(catalog.search_recipes("onion").await.unwrap().len(), 2);
    assert_eq!(catalog.search_recipes("red").await.unwrap().len(), 2);
    assert!(catalog.search_recipes("nothing-here").await.unwrap().is_empty());
}
