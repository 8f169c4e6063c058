//! Core of a multi-user recipe catalog: schema management, validated and
//! owner-scoped storage of recipes with their ingredients, tags and images,
//! recipe aggregation, and ranked free-text search over SQLite.

pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod validation;

use clap::Parser;
pub use config::Config;
pub use db::{SchemaStatus, Store};
pub use services::{CatalogError, CatalogService, SeaOrmCatalogService};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config);

    cli::dispatch(cli.command, &config).await
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
