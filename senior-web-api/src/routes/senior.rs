use crate::activity::{self, ACTION_ARCHIVE_SENIOR, ACTION_REGISTER_SENIOR, ACTION_RESTORE_SENIOR};
use crate::auth::{AdminUser, AuthUser};
use crate::dto::{reply, ApiResponse, SeniorDetails, SeniorRequest, RESPONSE_OK};
use crate::error::{ApiError, ValidationError};
use crate::pool::Db;
use crate::registry;
use rocket::serde::json::Json;
use sea_orm::DatabaseConnection;
use sea_orm_rocket::Connection;
use senior_db_entity::db::senior::{STATUS_ACTIVE, STATUS_ARCHIVED};

fn check_status(status: Option<&str>) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    match status {
        None | Some(STATUS_ACTIVE) | Some(STATUS_ARCHIVED) => {}
        Some(_) => errors.push("status", "Status must be active or archived"),
    }
    errors.into_result()
}

#[get("/seniors?<status>&<zone>")]
pub async fn list(
    conn: Connection<'_, Db>,
    _user: AuthUser,
    status: Option<&str>,
    zone: Option<&str>,
) -> ApiResponse<Vec<SeniorDetails>> {
    let db = conn.into_inner();
    if let Err(error) = check_status(status) {
        return ApiError::from(error).reply();
    }
    match registry::list(db, status, zone).await {
        Ok(seniors) => {
            let message = if seniors.is_empty() {
                "No residents found"
            } else {
                ""
            };
            let seniors = seniors.iter().map(SeniorDetails::new).collect();
            reply(RESPONSE_OK, message, Some(seniors))
        }
        Err(error) => ApiError::from(error).reply(),
    }
}

#[get("/seniors/<id>")]
pub async fn get(conn: Connection<'_, Db>, _user: AuthUser, id: i32) -> ApiResponse<SeniorDetails> {
    let db = conn.into_inner();
    match registry::find(db, id).await {
        Ok(Some(senior)) => reply(RESPONSE_OK, "", Some(SeniorDetails::new(&senior))),
        Ok(None) => ApiError::NotFound(format!("Resident {} not found", id)).reply(),
        Err(error) => ApiError::from(error).reply(),
    }
}

#[post("/seniors", format = "json", data = "<request>")]
pub async fn register(
    conn: Connection<'_, Db>,
    user: AuthUser,
    request: Json<SeniorRequest>,
) -> ApiResponse<SeniorDetails> {
    let db = conn.into_inner();
    let AuthUser(claims) = user;
    match registry::register(db, &request).await {
        Ok(senior) => {
            activity::record(
                db,
                &claims.username,
                ACTION_REGISTER_SENIOR,
                format!("Registered {} ({})", senior.display_name(), senior.sccn),
            )
            .await;
            reply(
                RESPONSE_OK,
                "Resident registered",
                Some(SeniorDetails::new(&senior)),
            )
        }
        Err(error) => error.reply(),
    }
}

async fn change_status(
    db: &DatabaseConnection,
    username: &str,
    id: i32,
    status: &str,
) -> Result<SeniorDetails, ApiError> {
    let senior = match registry::set_status(db, id, status).await? {
        Some(senior) => senior,
        None => return Err(ApiError::NotFound(format!("Resident {} not found", id))),
    };
    let (action, verb) = if status == STATUS_ARCHIVED {
        (ACTION_ARCHIVE_SENIOR, "Archived")
    } else {
        (ACTION_RESTORE_SENIOR, "Restored")
    };
    activity::record(
        db,
        username,
        action,
        format!("{} {} ({})", verb, senior.display_name(), senior.sccn),
    )
    .await;
    Ok(SeniorDetails::new(&senior))
}

#[post("/seniors/<id>/archive")]
pub async fn archive(
    conn: Connection<'_, Db>,
    admin: AdminUser,
    id: i32,
) -> ApiResponse<SeniorDetails> {
    let db = conn.into_inner();
    let AdminUser(claims) = admin;
    match change_status(db, &claims.username, id, STATUS_ARCHIVED).await {
        Ok(senior) => reply(RESPONSE_OK, "Resident archived", Some(senior)),
        Err(error) => error.reply(),
    }
}

#[post("/seniors/<id>/restore")]
pub async fn restore(
    conn: Connection<'_, Db>,
    admin: AdminUser,
    id: i32,
) -> ApiResponse<SeniorDetails> {
    let db = conn.into_inner();
    let AdminUser(claims) = admin;
    match change_status(db, &claims.username, id, STATUS_ACTIVE).await {
        Ok(senior) => reply(RESPONSE_OK, "Resident restored", Some(senior)),
        Err(error) => error.reply(),
    }
}

#[cfg(test)]
mod tests {
    use crate::dto::{RESPONSE_BAD_REQUEST, RESPONSE_FORBIDDEN};
    use crate::pool::SeniorConfig;
    use crate::test_utils::{api_client, bearer, envelope, insert_senior};
    use rocket::http::{ContentType, Status};

    const REGISTRATION: &str = r#"{
        "sccn": "700000000001",
        "first_name": "Lourdes",
        "last_name": "Mendoza",
        "birth_date": "1950-03-14",
        "sex": "F",
        "zone": "Zone 2"
    }"#;

    #[tokio::test]
    async fn registering_twice_is_a_bad_request() {
        let config = SeniorConfig::for_tests("logs");
        let (client, db) = api_client(config.clone()).await;
        let token = bearer(&db, &config, "encoder", false).await;

        let response = client
            .post("/seniors")
            .header(token.clone())
            .header(ContentType::JSON)
            .body(REGISTRATION)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(envelope(response).await.data.unwrap()["sccn"], "700000000001");

        let response = client
            .post("/seniors")
            .header(token)
            .header(ContentType::JSON)
            .body(REGISTRATION)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(envelope(response).await.code, Some(RESPONSE_BAD_REQUEST));
    }

    #[tokio::test]
    async fn only_administrators_archive_and_restore() {
        let config = SeniorConfig::for_tests("logs");
        let (client, db) = api_client(config.clone()).await;
        let staff = bearer(&db, &config, "encoder", false).await;
        let admin = bearer(&db, &config, "osca_admin", true).await;
        let senior = insert_senior(&db, "700000000002", "Navarro", None).await;

        for action in ["archive", "restore"] {
            let response = client
                .post(format!("/seniors/{}/{}", senior.id, action))
                .header(staff.clone())
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::Forbidden);
            assert_eq!(envelope(response).await.code, Some(RESPONSE_FORBIDDEN));
        }

        let response = client
            .post(format!("/seniors/{}/archive", senior.id))
            .header(admin.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(envelope(response).await.data.unwrap()["status"], "archived");

        let response = client
            .post("/seniors/404/restore")
            .header(admin)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn listing_rejects_unknown_status() {
        let config = SeniorConfig::for_tests("logs");
        let (client, db) = api_client(config.clone()).await;
        let token = bearer(&db, &config, "encoder", false).await;

        let response = client
            .get("/seniors?status=deceased")
            .header(token)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }
}
