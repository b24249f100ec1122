use sea_orm_migration::prelude::*;
use senior_db_entity::db::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250106_000001_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(senior::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(senior::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(senior::Column::Sccn)
                            .string_len(12)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(senior::Column::FirstName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(senior::Column::MiddleName).string_len(100))
                    .col(
                        ColumnDef::new(senior::Column::LastName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(senior::Column::BirthDate).date().not_null())
                    .col(ColumnDef::new(senior::Column::Sex).string_len(1).not_null())
                    .col(ColumnDef::new(senior::Column::Zone).string_len(50).not_null())
                    .col(ColumnDef::new(senior::Column::ContactNumber).string_len(20))
                    .col(ColumnDef::new(senior::Column::PensionType).string_len(50))
                    .col(
                        ColumnDef::new(senior::Column::Status)
                            .string_len(20)
                            .not_null()
                            .default(senior::STATUS_ACTIVE),
                    )
                    .col(
                        ColumnDef::new(senior::Column::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(senior::Column::ArchivedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(senior::Entity).to_owned())
            .await
    }
}
