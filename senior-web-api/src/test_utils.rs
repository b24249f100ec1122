use crate::auth::{hash_password, issue_token};
use crate::dto::ResponseData;
use crate::pool::{Db, SeaOrmPool, SeniorConfig};
use chrono::{NaiveDate, Utc};
use rocket::http::Header;
use rocket::local::asynchronous::{Client, LocalResponse};
use rocket::serde::json::Value;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ConnectOptions, Database, DatabaseConnection, Set,
};
use senior_db_entity::db::{app_user, senior};
use senior_db_migration::{Migrator, MigratorTrait};

const TEST_HASH_COST: u32 = 4;

/// Fresh in-memory database with every migration applied. A single pooled
/// connection keeps all queries on the same in-memory database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn insert_senior(
    db: &DatabaseConnection,
    sccn: &str,
    last_name: &str,
    pension_type: Option<&str>,
) -> senior::Model {
    senior::ActiveModel {
        id: NotSet,
        sccn: Set(sccn.to_owned()),
        first_name: Set("Juan".to_owned()),
        middle_name: Set(None),
        last_name: Set(last_name.to_owned()),
        birth_date: Set(NaiveDate::from_ymd_opt(1950, 5, 20).unwrap()),
        sex: Set("M".to_owned()),
        zone: Set("Zone 1".to_owned()),
        contact_number: Set(None),
        pension_type: Set(pension_type.map(str::to_owned)),
        status: Set(senior::STATUS_ACTIVE.to_owned()),
        created_at: Set(Utc::now()),
        archived_at: Set(None),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn archive_senior(db: &DatabaseConnection, id: i32) {
    crate::registry::set_status(db, id, senior::STATUS_ARCHIVED)
        .await
        .unwrap()
        .unwrap();
}

pub async fn insert_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    is_admin: bool,
    is_active: bool,
) -> app_user::Model {
    app_user::ActiveModel {
        id: NotSet,
        username: Set(username.to_owned()),
        password_hash: Set(hash_password(password, TEST_HASH_COST).unwrap()),
        full_name: Set(format!("{} user", username)),
        role: Set(if is_admin { "Administrator" } else { "Encoder" }.to_owned()),
        is_admin: Set(is_admin),
        is_active: Set(is_active),
        created_at: Set(Utc::now()),
        last_login: Set(None),
    }
    .insert(db)
    .await
    .unwrap()
}

/// The full API over a fresh migrated database. The returned connection
/// shares the pool the routes use.
pub async fn api_client(config: SeniorConfig) -> (Client, DatabaseConnection) {
    let db = setup_db().await;
    let rocket = crate::base(config)
        .manage(Db::from(SeaOrmPool { conn: db.clone() }))
        .attach(crate::routes::mount());
    (Client::tracked(rocket).await.unwrap(), db)
}

/// Creates the account and returns its `Authorization` header.
pub async fn bearer(
    db: &DatabaseConnection,
    config: &SeniorConfig,
    username: &str,
    is_admin: bool,
) -> Header<'static> {
    let user = insert_user(db, username, "correct horse", is_admin, true).await;
    let (token, _) = issue_token(&user, &config.jwt_key, 1).unwrap();
    Header::new("Authorization", format!("Bearer {}", token))
}

pub async fn envelope(response: LocalResponse<'_>) -> ResponseData<Value> {
    response.into_json::<ResponseData<Value>>().await.unwrap()
}
