pub mod aggregator;
pub use aggregator::RecipeAggregator;

pub mod search;
pub use search::SearchService;

pub mod catalog_service;
pub mod catalog_service_impl;
pub use catalog_service::{CatalogError, CatalogService};
pub use catalog_service_impl::SeaOrmCatalogService;
