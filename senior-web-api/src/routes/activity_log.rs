use crate::activity::{self, ActionCount, ACTION_CLEAR_LOGS, ACTION_EXPORT, MAX_PAGE_SIZE};
use crate::auth::AdminUser;
use crate::csv_export;
use crate::dto::{
    reply, ActivityDetails, ActivityPage, ApiResponse, CsvDownload, RESPONSE_BAD_REQUEST,
    RESPONSE_OK,
};
use crate::error::ApiError;
use crate::pool::Db;
use chrono::Utc;
use sea_orm_rocket::Connection;
use tracing::info;

#[get("/activity_logs?<page>&<limit>&<action>")]
pub async fn list(
    conn: Connection<'_, Db>,
    _admin: AdminUser,
    page: Option<u64>,
    limit: Option<u64>,
    action: Option<&str>,
) -> ApiResponse<ActivityPage> {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20);
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return reply(
            RESPONSE_BAD_REQUEST,
            format!("'limit' must be between 1 and {}", MAX_PAGE_SIZE),
            None,
        );
    }

    let db = conn.into_inner();
    match activity::list(db, page, limit, action).await {
        Ok((total_pages, activities)) => {
            let message = if activities.is_empty() {
                "No activity found"
            } else {
                ""
            };
            let page = ActivityPage {
                total_pages,
                activities: activities.iter().map(ActivityDetails::new).collect(),
            };
            reply(RESPONSE_OK, message, Some(page))
        }
        Err(error) => ApiError::from(error).reply(),
    }
}

#[get("/activity_logs/statistics")]
pub async fn statistics(
    conn: Connection<'_, Db>,
    _admin: AdminUser,
) -> ApiResponse<Vec<ActionCount>> {
    let db = conn.into_inner();
    match activity::statistics(db).await {
        Ok(counts) => reply(RESPONSE_OK, "", Some(counts)),
        Err(error) => ApiError::from(error).reply(),
    }
}

#[get("/activity_logs/export")]
pub async fn export(
    conn: Connection<'_, Db>,
    admin: AdminUser,
) -> Result<CsvDownload, ApiResponse<String>> {
    let db = conn.into_inner();
    let AdminUser(claims) = admin;
    let activities = activity::all(db)
        .await
        .map_err(|error| ApiError::from(error).reply())?;
    let body = csv_export::activity_csv(&activities)
        .map_err(|error| ApiError::from(error).reply())?;

    activity::record(
        db,
        &claims.username,
        ACTION_EXPORT,
        format!("Exported {} activity records", activities.len()),
    )
    .await;
    let file_name = format!("activity_logs_{}.csv", Utc::now().format("%Y%m%d"));
    Ok(CsvDownload::new(&file_name, body))
}

#[delete("/activity_logs")]
pub async fn clear(conn: Connection<'_, Db>, admin: AdminUser) -> ApiResponse<u64> {
    let db = conn.into_inner();
    let AdminUser(claims) = admin;
    match activity::clear(db).await {
        Ok(removed) => {
            info!("{} cleared {} activity records", claims.username, removed);
            // the clearing itself stays on record
            activity::record(
                db,
                &claims.username,
                ACTION_CLEAR_LOGS,
                format!("Cleared {} activity records", removed),
            )
            .await;
            reply(RESPONSE_OK, "Activity log cleared", Some(removed))
        }
        Err(error) => ApiError::from(error).reply(),
    }
}

#[cfg(test)]
mod tests {
    use crate::activity::{self, ACTION_LOGIN};
    use crate::dto::{RESPONSE_BAD_REQUEST, RESPONSE_FORBIDDEN};
    use crate::pool::SeniorConfig;
    use crate::test_utils::{api_client, bearer, envelope};
    use rocket::http::Status;

    #[tokio::test]
    async fn staff_cannot_reach_the_activity_log() {
        let config = SeniorConfig::for_tests("logs");
        let (client, db) = api_client(config.clone()).await;
        let staff = bearer(&db, &config, "encoder", false).await;

        for path in [
            "/activity_logs",
            "/activity_logs/statistics",
            "/activity_logs/export",
        ] {
            let response = client.get(path).header(staff.clone()).dispatch().await;
            assert_eq!(response.status(), Status::Forbidden, "{}", path);
            assert_eq!(envelope(response).await.code, Some(RESPONSE_FORBIDDEN));
        }
        let response = client.delete("/activity_logs").header(staff).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[tokio::test]
    async fn administrators_page_and_clear_the_activity_log() {
        let config = SeniorConfig::for_tests("logs");
        let (client, db) = api_client(config.clone()).await;
        let admin = bearer(&db, &config, "osca_admin", true).await;
        for _ in 0..3 {
            activity::record(&db, "encoder", ACTION_LOGIN, "Signed in".to_owned()).await;
        }

        let response = client
            .get("/activity_logs?page=1&limit=2")
            .header(admin.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let page = envelope(response).await.data.unwrap();
        assert_eq!(page["total_pages"], 2);
        assert_eq!(page["activities"].as_array().unwrap().len(), 2);

        let response = client
            .get("/activity_logs?limit=101")
            .header(admin.clone())
            .dispatch()
            .await;
        assert_eq!(envelope(response).await.code, Some(RESPONSE_BAD_REQUEST));

        let response = client.delete("/activity_logs").header(admin).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(envelope(response).await.data.unwrap(), 3);
    }
}
