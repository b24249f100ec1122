use crate::UtilsError;
use chrono::Utc;
use clap::Args;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, Set,
};
use senior_db_entity::db::app_user::{self, Column as UserColumn, Entity as AppUser};
use tracing::info;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Args)]
#[clap(args_conflicts_with_subcommands = true)]
#[clap(version = "v0.1.0", about = "Create a staff or administrator account")]
pub struct CreateUser {
    /// Login name, must be unique
    #[clap(short, long)]
    pub username: String,

    /// Initial password
    #[clap(short, long)]
    pub password: String,

    /// Name shown in the activity log and on the dashboard
    #[clap(short, long)]
    pub full_name: String,

    /// Free-text role label, viz. Encoder
    #[clap(short, long, default_value = "Staff")]
    pub role: String,

    /// Grant administrator access
    #[clap(short, long)]
    pub admin: bool,

    /// bcrypt cost factor
    #[clap(short, long, default_value_t = bcrypt::DEFAULT_COST)]
    pub cost: u32,
}

#[derive(Debug, Args)]
#[clap(args_conflicts_with_subcommands = true)]
#[clap(version = "v0.1.0", about = "Activate or deactivate an account")]
pub struct SetActive {
    #[clap(short, long)]
    pub username: String,

    /// true to activate, false to deactivate
    #[clap(short, long, action = clap::ArgAction::Set)]
    pub active: bool,
}

#[derive(Debug, Args)]
#[clap(args_conflicts_with_subcommands = true)]
#[clap(version = "v0.1.0", about = "Print the bcrypt hash of a password")]
pub struct HashPassword {
    #[clap(short, long)]
    pub password: String,

    #[clap(short, long, default_value_t = bcrypt::DEFAULT_COST)]
    pub cost: u32,
}

pub fn hash(params: &HashPassword) -> Result<String, UtilsError> {
    Ok(bcrypt::hash(&params.password, params.cost)?)
}

pub async fn create<C>(db: &C, params: &CreateUser) -> Result<app_user::Model, UtilsError>
where
    C: ConnectionTrait,
{
    let username = params.username.trim();
    if username.is_empty() || params.full_name.trim().is_empty() {
        return Err(UtilsError::Invalid(
            "Username and full name are required".to_owned(),
        ));
    }
    if params.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UtilsError::Invalid(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    let existing = AppUser::find()
        .filter(UserColumn::Username.eq(username))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(UtilsError::Invalid(format!("User {} already exists", username)));
    }

    let user = app_user::ActiveModel {
        id: NotSet,
        username: Set(username.to_owned()),
        password_hash: Set(bcrypt::hash(&params.password, params.cost)?),
        full_name: Set(params.full_name.trim().to_owned()),
        role: Set(params.role.trim().to_owned()),
        is_admin: Set(params.admin),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        last_login: Set(None),
    }
    .insert(db)
    .await?;
    info!("Created user {} (admin: {})", user.username, user.is_admin);
    Ok(user)
}

pub async fn set_active<C>(db: &C, params: &SetActive) -> Result<app_user::Model, UtilsError>
where
    C: ConnectionTrait,
{
    let user = match AppUser::find()
        .filter(UserColumn::Username.eq(params.username.trim()))
        .one(db)
        .await?
    {
        Some(user) => user,
        None => {
            return Err(UtilsError::Invalid(format!(
                "User {} not found",
                params.username
            )))
        }
    };

    let mut active = user.into_active_model();
    active.is_active = Set(params.active);
    let user = active.update(db).await?;
    info!("User {} active: {}", user.username, user.is_active);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};
    use senior_db_migration::{Migrator, MigratorTrait};

    async fn setup_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn create_params(username: &str, password: &str) -> CreateUser {
        CreateUser {
            username: username.to_owned(),
            password: password.to_owned(),
            full_name: "Elena Marquez".to_owned(),
            role: "Encoder".to_owned(),
            admin: false,
            cost: 4,
        }
    }

    #[test]
    fn hashes_verify_against_the_password() {
        let hashed = hash(&HashPassword {
            password: "correct horse".to_owned(),
            cost: 4,
        })
        .unwrap();
        assert!(bcrypt::verify("correct horse", &hashed).unwrap());
        assert!(!bcrypt::verify("battery staple", &hashed).unwrap());
    }

    #[tokio::test]
    async fn created_users_start_active_with_a_hashed_password() {
        let db = setup_db().await;
        let user = create(&db, &create_params("emarquez", "s3cret-pass"))
            .await
            .unwrap();

        assert!(user.is_active);
        assert_ne!(user.password_hash, "s3cret-pass");
        assert!(bcrypt::verify("s3cret-pass", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_and_weak_accounts_are_refused() {
        let db = setup_db().await;
        create(&db, &create_params("emarquez", "s3cret-pass"))
            .await
            .unwrap();

        assert!(matches!(
            create(&db, &create_params("emarquez", "an0ther-pass")).await,
            Err(UtilsError::Invalid(_))
        ));
        assert!(matches!(
            create(&db, &create_params("short", "abc")).await,
            Err(UtilsError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn accounts_can_be_deactivated() {
        let db = setup_db().await;
        create(&db, &create_params("emarquez", "s3cret-pass"))
            .await
            .unwrap();

        let user = set_active(
            &db,
            &SetActive {
                username: "emarquez".to_owned(),
                active: false,
            },
        )
        .await
        .unwrap();
        assert!(!user.is_active);
    }
}
