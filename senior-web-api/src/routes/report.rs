use crate::activity::{self, ACTION_EXPORT};
use crate::auth::AuthUser;
use crate::csv_export;
use crate::dto::{reply, ApiResponse, CsvDownload, RESPONSE_OK};
use crate::error::{ApiError, LedgerError, ValidationError};
use crate::ledger::{self, LedgerKind, Period, RangeTotals};
use crate::pool::Db;
use crate::registry;
use sea_orm::DatabaseConnection;
use sea_orm_rocket::Connection;
use senior_db_entity::db::senior::{STATUS_ACTIVE, STATUS_ARCHIVED};

const SENIORS_FILE_NAME: &str = "seniors.csv";

fn range_of(
    from_month: &str,
    from_year: i32,
    to_month: &str,
    to_year: i32,
) -> Result<(Period, Period), LedgerError> {
    Ok((
        Period::parse(from_month, from_year)?,
        Period::parse(to_month, to_year)?,
    ))
}

async fn load_range(
    db: &DatabaseConnection,
    kind: Result<LedgerKind, LedgerError>,
    from_month: &str,
    from_year: i32,
    to_month: &str,
    to_year: i32,
) -> Result<(LedgerKind, Period, Period, RangeTotals), ApiError> {
    let kind = kind?;
    let (from, to) = range_of(from_month, from_year, to_month, to_year)?;
    let totals = ledger::range_totals(db, kind, from, to).await?;
    Ok((kind, from, to, totals))
}

#[get("/reports/<kind>/range?<from_month>&<from_year>&<to_month>&<to_year>")]
pub async fn range(
    conn: Connection<'_, Db>,
    _user: AuthUser,
    kind: Result<LedgerKind, LedgerError>,
    from_month: &str,
    from_year: i32,
    to_month: &str,
    to_year: i32,
) -> ApiResponse<RangeTotals> {
    let db = conn.into_inner();
    match load_range(db, kind, from_month, from_year, to_month, to_year).await {
        Ok((_, _, _, totals)) => {
            let message = if totals.periods == 0 {
                "No saved logs in this range"
            } else {
                ""
            };
            reply(RESPONSE_OK, message, Some(totals))
        }
        Err(error) => error.reply(),
    }
}

#[get("/reports/<kind>/range/export?<from_month>&<from_year>&<to_month>&<to_year>")]
pub async fn range_export(
    conn: Connection<'_, Db>,
    user: AuthUser,
    kind: Result<LedgerKind, LedgerError>,
    from_month: &str,
    from_year: i32,
    to_month: &str,
    to_year: i32,
) -> Result<CsvDownload, ApiResponse<String>> {
    let db = conn.into_inner();
    let AuthUser(claims) = user;
    let (kind, from, to, totals) =
        load_range(db, kind, from_month, from_year, to_month, to_year)
            .await
            .map_err(|error| error.reply())?;
    let body =
        csv_export::range_csv(kind, &totals).map_err(|error| ApiError::from(error).reply())?;

    activity::record(
        db,
        &claims.username,
        ACTION_EXPORT,
        format!("Exported {} summary from {} to {}", kind, from, to),
    )
    .await;
    Ok(CsvDownload::new(
        &csv_export::range_file_name(kind, from, to),
        body,
    ))
}

#[get("/reports/seniors/export?<status>")]
pub async fn seniors_export(
    conn: Connection<'_, Db>,
    user: AuthUser,
    status: Option<&str>,
) -> Result<CsvDownload, ApiResponse<String>> {
    let db = conn.into_inner();
    let AuthUser(claims) = user;
    if let Some(status) = status.filter(|s| *s != STATUS_ACTIVE && *s != STATUS_ARCHIVED) {
        let mut errors = ValidationError::default();
        errors.push("status", format!("Unknown status '{}'", status));
        return Err(ApiError::from(errors).reply());
    }

    let seniors = registry::list(db, status, None)
        .await
        .map_err(|error| ApiError::from(error).reply())?;
    let body =
        csv_export::seniors_csv(&seniors).map_err(|error| ApiError::from(error).reply())?;

    activity::record(
        db,
        &claims.username,
        ACTION_EXPORT,
        format!("Exported {} residents", seniors.len()),
    )
    .await;
    Ok(CsvDownload::new(SENIORS_FILE_NAME, body))
}

#[cfg(test)]
mod tests {
    use crate::dto::RESPONSE_BAD_REQUEST;
    use crate::ledger::{self, LedgerKind, Period, PeriodTotals};
    use crate::pool::SeniorConfig;
    use crate::test_utils::{api_client, bearer, envelope};
    use rocket::http::Status;

    #[tokio::test]
    async fn range_sums_saved_logs() {
        let config = SeniorConfig::for_tests("logs");
        let (client, db) = api_client(config.clone()).await;
        let token = bearer(&db, &config, "encoder", false).await;
        for month in [1, 2] {
            let totals = PeriodTotals {
                total: 4,
                settled: month,
                unsettled: 4 - month,
            };
            let period = Period::new(month as u32, 2025).unwrap();
            ledger::save_log(&db, LedgerKind::Dues, period, "dues.csv", totals, 0, None)
                .await
                .unwrap();
        }

        let response = client
            .get("/reports/dues/range?from_month=Jan&from_year=2025&to_month=Mar&to_year=2025")
            .header(token)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let totals = envelope(response).await.data.unwrap();
        assert_eq!(totals["periods"], 2);
    }

    #[tokio::test]
    async fn inverted_range_and_unknown_kind_are_bad_requests() {
        let config = SeniorConfig::for_tests("logs");
        let (client, db) = api_client(config.clone()).await;
        let token = bearer(&db, &config, "encoder", false).await;

        let response = client
            .get("/reports/dues/range?from_month=May&from_year=2025&to_month=Jan&to_year=2025")
            .header(token.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(envelope(response).await.code, Some(RESPONSE_BAD_REQUEST));

        let response = client
            .get("/reports/rent/range?from_month=Jan&from_year=2025&to_month=Mar&to_year=2025")
            .header(token)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }
}
