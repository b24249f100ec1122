use crate::dto::AccessLevel;
use crate::error::AuthError;
use crate::pool::SeniorConfig;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::token::verified::VerifyWithKey;
use jwt::SignWithKey;
use rocket::http::Status;
use rocket::outcome::try_outcome;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::serde::Serialize;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set,
};
use senior_db_entity::db::app_user::{self, Column as UserColumn, Entity as AppUser};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{info, warn};

/// Verified identity carried by every authenticated request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Claims {
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub is_admin: bool,
    pub expiry: DateTime<Utc>,
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, cost)?)
}

fn password_matches(password: &str, password_hash: &str) -> bool {
    match bcrypt::verify(password, password_hash) {
        Ok(matches) => matches,
        Err(error) => {
            warn!("Stored password hash could not be verified: {}", error);
            false
        }
    }
}

/// Active user with this username and password. Unknown users, inactive users
/// and wrong passwords are all `None`.
pub async fn verify_credentials<C>(
    db: &C,
    username: &str,
    password: &str,
) -> Result<Option<app_user::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let user = AppUser::find()
        .filter(UserColumn::Username.eq(username.trim()))
        .filter(UserColumn::IsActive.eq(true))
        .one(db)
        .await?;

    Ok(user.filter(|user| password_matches(password, &user.password_hash)))
}

/// Like [`verify_credentials`], but the access level picked at login must
/// match the account's admin flag.
pub async fn verify_credentials_for_access<C>(
    db: &C,
    username: &str,
    password: &str,
    access_level: AccessLevel,
) -> Result<Option<app_user::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let user = match verify_credentials(db, username, password).await? {
        Some(user) => user,
        None => return Ok(None),
    };
    let matches = match access_level {
        AccessLevel::Admin => user.is_admin,
        AccessLevel::Staff => !user.is_admin,
    };
    if !matches {
        info!(
            "Access level {:?} does not match account {}",
            access_level, user.username
        );
        return Ok(None);
    }
    Ok(Some(user))
}

/// `Some(is_active)` for a known username.
pub async fn account_is_active<C>(db: &C, username: &str) -> Result<Option<bool>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(AppUser::find()
        .filter(UserColumn::Username.eq(username.trim()))
        .one(db)
        .await?
        .map(|user| user.is_active))
}

pub async fn touch_last_login<C>(db: &C, user: &app_user::Model) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let mut active = user.clone().into_active_model();
    active.last_login = Set(Some(Utc::now()));
    active.update(db).await?;
    Ok(())
}

fn signing_key(jwt_key: &str) -> Result<Hmac<Sha256>, AuthError> {
    Hmac::new_from_slice(jwt_key.as_bytes()).map_err(|error| AuthError::Key(error.to_string()))
}

pub fn issue_token(
    user: &app_user::Model,
    jwt_key: &str,
    ttl_hours: i64,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let key = signing_key(jwt_key)?;
    let expiry = Utc::now() + Duration::hours(ttl_hours);
    let expiry_string = expiry.to_rfc3339();
    let is_admin = user.is_admin.to_string();

    let mut claims: BTreeMap<&str, &str> = BTreeMap::new();
    claims.insert("sub", &user.username);
    claims.insert("name", &user.full_name);
    claims.insert("role", &user.role);
    claims.insert("admin", &is_admin);
    claims.insert("expiry", &expiry_string);

    match claims.sign_with_key(&key) {
        Ok(token) => Ok((token, expiry)),
        Err(error) => Err(AuthError::Key(error.to_string())),
    }
}

pub fn verify_token(jwt_key: &str, token: &str) -> Result<Claims, AuthError> {
    let key = signing_key(jwt_key)?;
    let claims: BTreeMap<String, String> = match token.verify_with_key(&key) {
        Ok(claims) => claims,
        Err(error) => {
            info!("JWT verification error: {}", error);
            return Err(AuthError::InvalidToken);
        }
    };

    let claim = |name: &str| claims.get(name).cloned().ok_or(AuthError::InvalidToken);
    let expiry = match DateTime::<chrono::FixedOffset>::from_str(&claim("expiry")?) {
        Ok(expiry) => expiry.with_timezone(&Utc),
        Err(error) => {
            warn!("Bad expiry string: {}", error);
            return Err(AuthError::InvalidToken);
        }
    };
    if Utc::now() > expiry {
        info!("JWT token is expired");
        return Err(AuthError::Expired);
    }

    Ok(Claims {
        username: claim("sub")?,
        full_name: claim("name")?,
        role: claim("role")?,
        is_admin: claim("admin")? == "true",
        expiry,
    })
}

/// Any signed-in user.
#[derive(Debug)]
pub struct AuthUser(pub Claims);

/// A signed-in user whose claims carry the admin flag.
#[derive(Debug)]
pub struct AdminUser(pub Claims);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match req.rocket().state::<SeniorConfig>() {
            Some(config) => config,
            None => {
                return Outcome::Error((
                    Status::InternalServerError,
                    AuthError::Key("configuration not managed".to_owned()),
                ))
            }
        };
        let token = match req.headers().get_one("Authorization") {
            None => return Outcome::Error((Status::Unauthorized, AuthError::Missing)),
            Some(header) => match header.strip_prefix("Bearer ") {
                Some(token) => token.trim(),
                None => return Outcome::Error((Status::Unauthorized, AuthError::Malformed)),
            },
        };
        match verify_token(&config.jwt_key, token) {
            Ok(claims) => Outcome::Success(AuthUser(claims)),
            Err(error) => Outcome::Error((Status::Unauthorized, error)),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let AuthUser(claims) = try_outcome!(req.guard::<AuthUser>().await);
        if !claims.is_admin {
            warn!("{} attempted an administrator action", claims.username);
            return Outcome::Error((Status::Forbidden, AuthError::Forbidden));
        }
        Outcome::Success(AdminUser(claims))
    }
}
