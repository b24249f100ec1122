use sea_orm_migration::prelude::*;
use senior_db_entity::db::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250106_000003_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ledger_entry::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ledger_entry::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ledger_entry::Column::Kind)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ledger_entry::Column::SeniorId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ledger_entry::Column::Month).integer().not_null())
                    .col(ColumnDef::new(ledger_entry::Column::Year).integer().not_null())
                    .col(
                        ColumnDef::new(ledger_entry::Column::Settled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ledger_entry::Column::SettledAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(ledger_entry::Column::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entry_senior")
                            .from(ledger_entry::Entity, ledger_entry::Column::SeniorId)
                            .to(senior::Entity, senior::Column::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ledger_entry::Entity).to_owned())
            .await
    }
}
