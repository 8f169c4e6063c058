use super::add_column_if_missing;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        add_column_if_missing(
            manager,
            "recipes",
            "serving_unit",
            ColumnDef::new(Recipes::ServingUnit)
                .string_len(20)
                .not_null()
                .default("people")
                .to_owned(),
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Recipes::Table)
                    .drop_column(Recipes::ServingUnit)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    ServingUnit,
}
