mod activity;
mod auth;
mod cors;
mod csv_export;
mod dto;
mod error;
mod ledger;
mod maintenance;
mod pool;
mod registry;
mod request_timer;
mod routes;
mod sql_stmt;
#[cfg(test)]
mod test_utils;
mod validation;

use dto::{
    reply, ApiResponse, ResponseData, RESPONSE_BAD_REQUEST, RESPONSE_FORBIDDEN,
    RESPONSE_INTERNAL_ERROR, RESPONSE_NOT_FOUND, RESPONSE_UNAUTHORIZED, RESPONSE_UNAVAILABLE,
    RESPONSE_UNPROCESSABLE,
};
use pool::{Db, SeniorConfig};
use rocket::{serde::json::Json, Build, Config, Request, Rocket};
use sea_orm_rocket::Database;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[macro_use]
extern crate rocket;

#[get("/")]
async fn health_ping() -> &'static str {
    ""
}

#[get("/maintenance_mode")]
async fn maintenance_mode() -> ApiResponse<String> {
    reply(
        RESPONSE_UNAVAILABLE,
        "The system is under maintenance. Please try again later.",
        None,
    )
}

#[catch(400)]
async fn bad_request() -> Json<ResponseData<String>> {
    Json(ResponseData::new(
        RESPONSE_BAD_REQUEST,
        "Please check the request parameters.".to_owned(),
        None,
    ))
}

#[catch(401)]
async fn unauthorized() -> Json<ResponseData<String>> {
    Json(ResponseData::new(
        RESPONSE_UNAUTHORIZED,
        "Please sign in to continue.".to_owned(),
        None,
    ))
}

#[catch(403)]
async fn forbidden() -> Json<ResponseData<String>> {
    Json(ResponseData::new(
        RESPONSE_FORBIDDEN,
        "Administrator access required.".to_owned(),
        None,
    ))
}

#[catch(404)]
async fn not_found(req: &Request<'_>) -> Json<ResponseData<String>> {
    let message = format!("Couldn't find '{}'", req.uri());
    Json(ResponseData::new(RESPONSE_NOT_FOUND, message, None))
}

#[catch(422)]
async fn unprocessable() -> Json<ResponseData<String>> {
    Json(ResponseData::new(
        RESPONSE_UNPROCESSABLE,
        "The request body could not be read. Please check its fields.".to_owned(),
        None,
    ))
}

#[catch(500)]
async fn internal_error() -> Json<ResponseData<String>> {
    Json(ResponseData::new(
        RESPONSE_INTERNAL_ERROR,
        "System error. Please contact administrator!".to_owned(),
        None,
    ))
}

/// Everything except the database pool and the API routes.
fn base(config: SeniorConfig) -> Rocket<Build> {
    let cors = cors::OriginHeader::from_setting(&config.cors_allowed_domains);

    rocket::build()
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                internal_error
            ],
        )
        .attach(request_timer::RequestTimer)
        .attach(maintenance::MaintenanceMode)
        .manage(config)
        .attach(cors)
        .mount("/", routes![health_ping, maintenance_mode])
}

#[launch]
async fn rocket() -> _ {
    let senior_config = Config::figment()
        .extract::<SeniorConfig>()
        .expect("Invalid Rocket configuration");
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &senior_config.rust_log);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                format!("senior_web_api={}", &senior_config.web_api_log)
                    .parse()
                    .expect("Error parsing directive"),
            ),
        )
        .with_span_events(FmtSpan::FULL)
        .init();

    base(senior_config)
        .attach(Db::init())
        .attach(routes::mount())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::{issue_token, AdminUser, AuthUser};
    use chrono::Utc;
    use rocket::http::{Header, Status};
    use rocket::local::asynchronous::Client;
    use rocket::serde::json::Value;
    use senior_db_entity::db::app_user;

    #[get("/whoami")]
    fn whoami(user: AuthUser) -> String {
        user.0.username
    }

    #[get("/admin_only")]
    fn admin_only(admin: AdminUser) -> String {
        admin.0.username
    }

    fn user(is_admin: bool) -> app_user::Model {
        app_user::Model {
            id: 7,
            username: if is_admin { "osca_admin" } else { "encoder" }.to_owned(),
            password_hash: String::new(),
            full_name: "Test User".to_owned(),
            role: "Staff".to_owned(),
            is_admin,
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    async fn client(config: SeniorConfig) -> Client {
        let rocket = base(config).mount("/", routes![whoami, admin_only]);
        Client::tracked(rocket).await.unwrap()
    }

    fn bearer(is_admin: bool) -> Header<'static> {
        let config = SeniorConfig::for_tests("logs");
        let (token, _) = issue_token(&user(is_admin), &config.jwt_key, 1).unwrap();
        Header::new("Authorization", format!("Bearer {}", token))
    }

    async fn envelope_code(response: rocket::local::asynchronous::LocalResponse<'_>) -> Option<u16> {
        response
            .into_json::<ResponseData<Value>>()
            .await
            .and_then(|body| body.code)
    }

    #[tokio::test]
    async fn missing_token_gets_the_unauthorized_envelope() {
        let client = client(SeniorConfig::for_tests("logs")).await;
        let response = client.get("/whoami").dispatch().await;

        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(envelope_code(response).await, Some(RESPONSE_UNAUTHORIZED));
    }

    #[tokio::test]
    async fn valid_token_passes_the_guard() {
        let client = client(SeniorConfig::for_tests("logs")).await;
        let response = client.get("/whoami").header(bearer(false)).dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.as_deref(), Some("encoder"));
    }

    #[tokio::test]
    async fn staff_tokens_are_forbidden_from_admin_routes() {
        let client = client(SeniorConfig::for_tests("logs")).await;

        let response = client.get("/admin_only").header(bearer(false)).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(envelope_code(response).await, Some(RESPONSE_FORBIDDEN));

        let response = client.get("/admin_only").header(bearer(true)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[tokio::test]
    async fn unknown_paths_get_the_not_found_envelope() {
        let client = client(SeniorConfig::for_tests("logs")).await;
        let response = client.get("/no/such/page").dispatch().await;

        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(envelope_code(response).await, Some(RESPONSE_NOT_FOUND));
    }

    #[tokio::test]
    async fn maintenance_mode_reroutes_everything_but_health() {
        let mut config = SeniorConfig::for_tests("logs");
        config.enable_maintenance = true;
        let client = client(config).await;

        let response = client.get("/whoami").header(bearer(false)).dispatch().await;
        assert_eq!(response.status(), Status::ServiceUnavailable);
        assert_eq!(envelope_code(response).await, Some(RESPONSE_UNAVAILABLE));

        let response = client.get("/").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[tokio::test]
    async fn allowed_origins_get_cors_headers() {
        let client = client(SeniorConfig::for_tests("logs")).await;
        let response = client
            .get("/")
            .header(Header::new("Origin", "http://localhost:3000"))
            .dispatch()
            .await;

        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("http://localhost:3000")
        );
    }
}
