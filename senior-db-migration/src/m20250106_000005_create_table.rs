use sea_orm_migration::prelude::*;
use senior_db_entity::db::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250106_000005_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(activity_log::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(activity_log::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(activity_log::Column::Username)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(activity_log::Column::Action)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(activity_log::Column::Description).text().not_null())
                    .col(
                        ColumnDef::new(activity_log::Column::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(activity_log::Entity).to_owned())
            .await
    }
}
