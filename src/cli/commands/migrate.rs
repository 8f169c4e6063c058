//! Migrate command handler

use crate::config::Config;
use crate::db::{PoolSettings, SchemaStatus, Store};

pub async fn cmd_migrate(config: &Config) -> anyhow::Result<()> {
    let store = Store::open(
        &config.general.database_path,
        PoolSettings::from(&config.general),
    )
    .await?;

    match store.ensure_schema().await? {
        SchemaStatus::Ready => println!("Schema is up to date."),
        SchemaStatus::Degraded(reason) => {
            println!("Schema is usable but a migration failed: {reason}");
            println!("It will be retried on the next run.");
        }
    }

    let report = store.seed_reference_data(&config.seed).await?;
    println!(
        "Seeded {} ingredients and {} tags ({} skipped).",
        report.ingredients_created, report.tags_created, report.skipped
    );

    store.close().await
}
