mod users;

use clap::{Parser, Subcommand};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};
use users::{CreateUser, HashPassword, SetActive};

#[derive(Debug, Parser)]
#[clap(name = "senior-utils")]
#[clap(about = "Registry administration CLI", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    CreateUser(CreateUser),
    SetActive(SetActive),
    HashPassword(HashPassword),
}

#[derive(Debug, Deserialize)]
struct AppConfig {
    database_url: String,
}

#[derive(Error, Debug)]
pub enum UtilsError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("{0}")]
    Invalid(String),
}

fn app_config() -> Result<AppConfig, UtilsError> {
    Ok(Figment::new()
        .merge(Toml::file("App.toml"))
        .merge(Env::prefixed("SENIOR_"))
        .extract()?)
}

#[tokio::main]
async fn main() -> Result<(), UtilsError> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                "senior_utils=info"
                    .parse()
                    .expect("Error parsing directive"),
            ),
        )
        .with_span_events(FmtSpan::FULL)
        .init();

    let cli: Cli = Cli::parse();

    match cli.commands {
        Commands::HashPassword(params) => {
            println!("{}", users::hash(&params)?);
        }
        Commands::CreateUser(params) => {
            let db = sea_orm::Database::connect(app_config()?.database_url).await?;
            users::create(&db, &params).await?;
        }
        Commands::SetActive(params) => {
            let db = sea_orm::Database::connect(app_config()?.database_url).await?;
            users::set_active(&db, &params).await?;
        }
    }

    Ok(())
}
