pub use sea_orm_migration::prelude::*;

mod m20250106_000001_create_table;
mod m20250106_000002_create_table;
mod m20250106_000003_create_table;
mod m20250106_000004_create_table;
mod m20250106_000005_create_table;
mod m20250120_000001_create_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250106_000001_create_table::Migration),
            Box::new(m20250106_000002_create_table::Migration),
            Box::new(m20250106_000003_create_table::Migration),
            Box::new(m20250106_000004_create_table::Migration),
            Box::new(m20250106_000005_create_table::Migration),
            Box::new(m20250120_000001_create_index::Migration),
        ]
    }
}
