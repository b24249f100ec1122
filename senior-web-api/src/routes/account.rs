use crate::activity::{self, ACTION_LOGIN, ACTION_LOGIN_FAILED, ACTION_LOGOUT};
use crate::auth::{self, AuthUser, Claims};
use crate::dto::{reply, ApiResponse, LoginRequest, LoginResponse, RESPONSE_OK};
use crate::error::{ApiError, ValidationError};
use crate::pool::{Db, SeniorConfig};
use rocket::{serde::json::Json, State};
use sea_orm::DatabaseConnection;
use sea_orm_rocket::Connection;
use tracing::{info, warn};

#[post("/auth/login", format = "json", data = "<login>")]
pub async fn login(
    conn: Connection<'_, Db>,
    config: &State<SeniorConfig>,
    login: Json<LoginRequest>,
) -> ApiResponse<LoginResponse> {
    let db = conn.into_inner();
    match authenticate(db, config, &login).await {
        Ok(response) => reply(RESPONSE_OK, "Login successful", Some(response)),
        Err(error) => error.reply(),
    }
}

async fn authenticate(
    db: &DatabaseConnection,
    config: &SeniorConfig,
    login: &LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let username = login.username.trim();
    let mut errors = ValidationError::default();
    if username.is_empty() {
        errors.push("username", "Username is required");
    }
    if login.password.is_empty() {
        errors.push("password", "Password is required");
    }
    errors.into_result()?;

    let user = match login.access_level {
        Some(access_level) => {
            auth::verify_credentials_for_access(db, username, &login.password, access_level)
                .await?
        }
        None => auth::verify_credentials(db, username, &login.password).await?,
    };

    let user = match user {
        Some(user) => user,
        None => {
            activity::record(db, username, ACTION_LOGIN_FAILED, "Failed login attempt").await;
            if auth::account_is_active(db, username).await? == Some(false) {
                return Err(ApiError::Unauthorized(
                    "Your account has been deactivated. Please contact the administrator."
                        .to_owned(),
                ));
            }
            return Err(ApiError::Unauthorized(
                "Invalid username or password".to_owned(),
            ));
        }
    };

    if let Err(error) = auth::touch_last_login(db, &user).await {
        warn!("Failed updating last login of {}: {:?}", user.username, error);
    }
    let (token, expiry) = auth::issue_token(&user, &config.jwt_key, config.token_ttl_hours())?;
    activity::record(db, &user.username, ACTION_LOGIN, "Signed in").await;
    info!("{} signed in", user.username);

    Ok(LoginResponse::new(&user, token, expiry))
}

#[get("/auth/me")]
pub async fn me(user: AuthUser) -> ApiResponse<Claims> {
    let AuthUser(claims) = user;
    reply(RESPONSE_OK, "", Some(claims))
}

/// Tokens are stateless, so signing out only leaves an audit record.
#[post("/auth/logout")]
pub async fn logout(conn: Connection<'_, Db>, user: AuthUser) -> ApiResponse<String> {
    let db = conn.into_inner();
    let AuthUser(claims) = user;
    activity::record(db, &claims.username, ACTION_LOGOUT, "Signed out").await;
    reply(RESPONSE_OK, "Signed out", None)
}

#[cfg(test)]
mod tests {
    use crate::dto::RESPONSE_UNAUTHORIZED;
    use crate::pool::SeniorConfig;
    use crate::test_utils::{api_client, envelope, insert_user};
    use rocket::http::{ContentType, Header, Status};

    #[tokio::test]
    async fn issued_token_opens_the_profile() {
        let (client, db) = api_client(SeniorConfig::for_tests("logs")).await;
        insert_user(&db, "encoder", "barangay-2025", false, true).await;

        let response = client
            .post("/auth/login")
            .header(ContentType::JSON)
            .body(r#"{"username": "encoder", "password": "barangay-2025"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let login = envelope(response).await.data.unwrap();
        let token = login["token"].as_str().unwrap().to_owned();

        let response = client
            .get("/auth/me")
            .header(Header::new("Authorization", format!("Bearer {}", token)))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(envelope(response).await.data.unwrap()["username"], "encoder");
    }

    #[tokio::test]
    async fn deactivated_accounts_are_told_so() {
        let (client, db) = api_client(SeniorConfig::for_tests("logs")).await;
        insert_user(&db, "retired", "barangay-2025", false, false).await;

        let response = client
            .post("/auth/login")
            .header(ContentType::JSON)
            .body(r#"{"username": "retired", "password": "barangay-2025"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
        let body = envelope(response).await;
        assert_eq!(body.code, Some(RESPONSE_UNAUTHORIZED));
        assert!(body.message.contains("deactivated"));
    }
}
