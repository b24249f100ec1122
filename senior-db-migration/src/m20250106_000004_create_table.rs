use sea_orm_migration::prelude::*;
use senior_db_entity::db::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250106_000004_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ledger_log::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ledger_log::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ledger_log::Column::Kind).string_len(20).not_null())
                    .col(ColumnDef::new(ledger_log::Column::Month).integer().not_null())
                    .col(ColumnDef::new(ledger_log::Column::Year).integer().not_null())
                    .col(ColumnDef::new(ledger_log::Column::FilePath).string().not_null())
                    .col(
                        ColumnDef::new(ledger_log::Column::TotalSeniors)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ledger_log::Column::Settled)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ledger_log::Column::Unsettled)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ledger_log::Column::NewEntrants)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ledger_log::Column::Notes).text())
                    .col(
                        ColumnDef::new(ledger_log::Column::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ledger_log::Column::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ledger_log::Entity).to_owned())
            .await
    }
}
