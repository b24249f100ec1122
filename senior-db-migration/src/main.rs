use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use sea_orm_migration::prelude::*;
use serde::Deserialize;

#[derive(Deserialize)]
struct MigrationConfig {
    database_url: Option<String>,
}

#[tokio::main]
async fn main() {
    // `DATABASE_URL` from the environment wins over App.toml
    if std::env::var("DATABASE_URL").is_err() {
        let config: MigrationConfig = Figment::new()
            .merge(Toml::file("App.toml"))
            .merge(Env::prefixed("SENIOR_"))
            .extract()
            .expect("Error reading App.toml");
        if let Some(database_url) = config.database_url {
            std::env::set_var("DATABASE_URL", database_url);
        }
    }

    cli::run_cli(senior_db_migration::Migrator).await;
}
