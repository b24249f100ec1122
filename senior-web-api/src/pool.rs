use async_trait::async_trait;
use rocket::serde::Deserialize;
use rocket::Config;
use sea_orm::{ConnectOptions, DbErr};
use sea_orm_rocket::{rocket::figment::Figment, Database};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 12;
const DEFAULT_LOGS_DIR: &str = "logs";

#[derive(Database, Debug)]
#[database("sea_orm")]
pub struct Db(SeaOrmPool);

#[derive(Debug, Clone)]
pub struct SeaOrmPool {
    pub conn: sea_orm::DatabaseConnection,
}

#[async_trait]
impl sea_orm_rocket::Pool for SeaOrmPool {
    type Error = sea_orm::DbErr;

    type Connection = sea_orm::DatabaseConnection;

    async fn init(_figment: &Figment) -> Result<Self, Self::Error> {
        let config = Config::figment()
            .extract::<SeniorConfig>()
            .map_err(|error| DbErr::Custom(format!("Invalid configuration: {}", error)))?;
        let conn = sea_orm::Database::connect(config.connect_options()).await?;

        Ok(SeaOrmPool { conn })
    }

    fn borrow(&self) -> &Self::Connection {
        &self.conn
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "rocket::serde")]
pub struct SeniorConfig {
    database_url: String,
    sqlx_max_connections: u32,
    sqlx_min_connections: Option<u32>,
    sqlx_connect_timeout: Option<u64>,
    sqlx_idle_timeout: Option<u64>,
    sqlx_max_lifetime: Option<u64>,
    sqlx_logging: Option<bool>,
    web_api_sqlx_logging_level: String,
    pub rust_log: String,
    pub web_api_log: String,
    pub cors_allowed_domains: String,
    pub jwt_key: String,
    token_ttl_hours: Option<i64>,
    logs_dir: Option<String>,
    pub enable_maintenance: bool,
    #[serde(default)]
    pub enable_request_timer: bool,
}

impl SeniorConfig {
    pub fn connect_options(&self) -> ConnectOptions {
        let mut options: ConnectOptions = self.database_url.to_owned().into();
        options
            .max_connections(self.sqlx_max_connections)
            .min_connections(self.sqlx_min_connections.unwrap_or(2))
            .connect_timeout(Duration::from_secs(self.sqlx_connect_timeout.unwrap_or(8)))
            .idle_timeout(Duration::from_secs(self.sqlx_idle_timeout.unwrap_or(8)))
            .max_lifetime(Duration::from_secs(self.sqlx_max_lifetime.unwrap_or(8)))
            .sqlx_logging(self.sqlx_logging.unwrap_or(false))
            .sqlx_logging_level(
                match self.web_api_sqlx_logging_level.parse::<log::LevelFilter>() {
                    Ok(level) => level,
                    Err(_) => log::LevelFilter::Info,
                },
            );
        options
    }

    pub fn token_ttl_hours(&self) -> i64 {
        match self.token_ttl_hours {
            Some(hours) if hours > 0 => hours,
            _ => DEFAULT_TOKEN_TTL_HOURS,
        }
    }

    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(self.logs_dir.as_deref().unwrap_or(DEFAULT_LOGS_DIR))
    }
}

#[cfg(test)]
impl SeniorConfig {
    pub fn for_tests(logs_dir: &str) -> Self {
        SeniorConfig {
            database_url: "sqlite::memory:".to_owned(),
            sqlx_max_connections: 1,
            sqlx_min_connections: Some(1),
            sqlx_connect_timeout: None,
            sqlx_idle_timeout: None,
            sqlx_max_lifetime: None,
            sqlx_logging: Some(false),
            web_api_sqlx_logging_level: "warn".to_owned(),
            rust_log: "warn".to_owned(),
            web_api_log: "info".to_owned(),
            cors_allowed_domains: "http://localhost:3000".to_owned(),
            jwt_key: "test-signing-key".to_owned(),
            token_ttl_hours: None,
            logs_dir: Some(logs_dir.to_owned()),
            enable_maintenance: false,
            enable_request_timer: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_optional_settings_are_missing() {
        let mut config = SeniorConfig::for_tests("exports");
        config.token_ttl_hours = Some(0);
        config.logs_dir = None;

        assert_eq!(config.token_ttl_hours(), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(config.logs_dir(), PathBuf::from(DEFAULT_LOGS_DIR));
    }

    #[test]
    fn configured_values_win_over_defaults() {
        let mut config = SeniorConfig::for_tests("exports");
        config.token_ttl_hours = Some(2);

        assert_eq!(config.token_ttl_hours(), 2);
        assert_eq!(config.logs_dir(), PathBuf::from("exports"));
    }
}
