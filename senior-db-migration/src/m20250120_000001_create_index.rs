use sea_orm_migration::prelude::*;
use senior_db_entity::db::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250120_000001_create_index"
    }
}

const LEDGER_ENTRY_PERIOD_INDEX: &str = "uq_ledger_entry_kind_senior_period";
const LEDGER_LOG_PERIOD_INDEX: &str = "uq_ledger_log_kind_period";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // lazy period creation relies on this constraint for ON CONFLICT DO NOTHING
        manager
            .create_index(
                Index::create()
                    .name(LEDGER_ENTRY_PERIOD_INDEX)
                    .table(ledger_entry::Entity)
                    .col(ledger_entry::Column::Kind)
                    .col(ledger_entry::Column::SeniorId)
                    .col(ledger_entry::Column::Month)
                    .col(ledger_entry::Column::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(LEDGER_LOG_PERIOD_INDEX)
                    .table(ledger_log::Entity)
                    .col(ledger_log::Column::Kind)
                    .col(ledger_log::Column::Month)
                    .col(ledger_log::Column::Year)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(LEDGER_LOG_PERIOD_INDEX)
                    .table(ledger_log::Entity)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name(LEDGER_ENTRY_PERIOD_INDEX)
                    .table(ledger_entry::Entity)
                    .to_owned(),
            )
            .await
    }
}
