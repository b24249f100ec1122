use sea_orm_migration::prelude::*;
use senior_db_entity::db::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250106_000002_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(app_user::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(app_user::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(app_user::Column::Username)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(app_user::Column::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(app_user::Column::FullName)
                            .string_len(150)
                            .not_null(),
                    )
                    .col(ColumnDef::new(app_user::Column::Role).string_len(50).not_null())
                    .col(
                        ColumnDef::new(app_user::Column::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(app_user::Column::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(app_user::Column::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(app_user::Column::LastLogin).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(app_user::Entity).to_owned())
            .await
    }
}
