use crate::activity::{self, ACTION_EXPORT, ACTION_SAVE_LOG, ACTION_TOGGLE_ENTRY};
use crate::auth::AuthUser;
use crate::csv_export;
use crate::dto::{
    reply, ApiResponse, CsvDownload, LogDetails, PeriodView, SaveLogRequest, RESPONSE_OK,
};
use crate::error::{ApiError, LedgerError};
use crate::ledger::{self, LedgerEntry, LedgerKind, Period, PeriodTotals};
use crate::pool::{Db, SeniorConfig};
use rocket::{serde::json::Json, State};
use sea_orm::DatabaseConnection;
use sea_orm_rocket::Connection;
use tracing::{error, info, warn};

#[get("/ledger/<kind>?<month>&<year>&<pension_type>")]
pub async fn view(
    conn: Connection<'_, Db>,
    _user: AuthUser,
    kind: Result<LedgerKind, LedgerError>,
    month: Option<&str>,
    year: Option<i32>,
    pension_type: Option<&str>,
) -> ApiResponse<PeriodView> {
    let db = conn.into_inner();
    let (kind, period) = match kind.and_then(|kind| Ok((kind, Period::from_query(month, year)?))) {
        Ok(selection) => selection,
        Err(error) => return ApiError::from(error).reply(),
    };

    match load_period(db, kind, period, pension_type).await {
        Ok((entries, new_entrants)) => {
            let message = if entries.is_empty() {
                "No entries for this period"
            } else {
                ""
            };
            let view = PeriodView::new(kind, period, entries, new_entrants);
            reply(RESPONSE_OK, message, Some(view))
        }
        Err(ledger_error) => {
            // render the empty ledger so the page still loads
            error!("Failed loading {} for {}: {:?}", kind, period, ledger_error);
            let error = ApiError::from(ledger_error);
            reply(
                error.code(),
                error.public_message(),
                Some(PeriodView::empty(kind, period)),
            )
        }
    }
}

async fn load_period(
    db: &DatabaseConnection,
    kind: LedgerKind,
    period: Period,
    pension_type: Option<&str>,
) -> Result<(Vec<LedgerEntry>, u64), LedgerError> {
    let entries = ledger::get_or_create_period(db, kind, period, pension_type).await?;
    let new_entrants = ledger::count_new_entrants(db, kind, period).await?;
    Ok((entries, new_entrants))
}

#[post("/ledger/entries/<id>/toggle")]
pub async fn toggle(conn: Connection<'_, Db>, user: AuthUser, id: i32) -> ApiResponse<LedgerEntry> {
    let db = conn.into_inner();
    let AuthUser(claims) = user;
    match toggle_and_reload(db, id).await {
        Ok(entry) => {
            let state = if entry.settled { "settled" } else { "unsettled" };
            activity::record(
                db,
                &claims.username,
                ACTION_TOGGLE_ENTRY,
                format!("Marked entry {} of {} as {}", entry.id, entry.name, state),
            )
            .await;
            reply(RESPONSE_OK, "Entry updated", Some(entry))
        }
        Err(error) => error.reply(),
    }
}

async fn toggle_and_reload(db: &DatabaseConnection, id: i32) -> Result<LedgerEntry, ApiError> {
    if !ledger::toggle_entry(db, id).await? {
        return Err(ApiError::NotFound(format!("Ledger entry {} not found", id)));
    }
    match ledger::find_entry(db, id).await? {
        Some(entry) => Ok(entry),
        None => Err(ApiError::NotFound(format!("Ledger entry {} not found", id))),
    }
}

#[post("/ledger/<kind>/log?<month>&<year>", format = "json", data = "<request>")]
pub async fn save_log(
    conn: Connection<'_, Db>,
    config: &State<SeniorConfig>,
    user: AuthUser,
    kind: Result<LedgerKind, LedgerError>,
    month: Option<&str>,
    year: Option<i32>,
    request: Json<SaveLogRequest>,
) -> ApiResponse<LogDetails> {
    let db = conn.into_inner();
    let AuthUser(claims) = user;
    let (kind, period) = match kind.and_then(|kind| Ok((kind, Period::from_query(month, year)?))) {
        Ok(selection) => selection,
        Err(error) => return ApiError::from(error).reply(),
    };

    match write_log(db, config, kind, period, request.into_inner().notes).await {
        Ok(log) => {
            activity::record(
                db,
                &claims.username,
                ACTION_SAVE_LOG,
                format!("Saved {} log for {}", kind, period),
            )
            .await;
            reply(RESPONSE_OK, "Log saved", Some(log))
        }
        Err(error) => error.reply(),
    }
}

/// Writes the period's CSV under the logs directory and upserts its log row.
/// A file left behind by an earlier save under another path is removed once
/// the row points at the new one.
async fn write_log(
    db: &DatabaseConnection,
    config: &SeniorConfig,
    kind: LedgerKind,
    period: Period,
    notes: Option<String>,
) -> Result<LogDetails, ApiError> {
    let (entries, new_entrants) = load_period(db, kind, period, None).await?;
    let contents = csv_export::period_csv(kind, period, &entries, new_entrants)?;
    let previous = ledger::find_log(db, kind, period).await?;

    let path = csv_export::persist(&config.logs_dir(), kind, period, &contents).await?;
    let file_path = path.to_string_lossy().into_owned();
    let notes = notes
        .map(|notes| notes.trim().to_owned())
        .filter(|notes| !notes.is_empty());
    let log = ledger::save_log(
        db,
        kind,
        period,
        &file_path,
        PeriodTotals::of(&entries),
        new_entrants,
        notes,
    )
    .await?;

    if let Some(previous) = previous.filter(|log| log.file_path != file_path) {
        match tokio::fs::remove_file(&previous.file_path).await {
            Ok(()) => info!("Removed replaced export {}", previous.file_path),
            Err(error) => warn!(
                "Could not remove replaced export {}: {}",
                previous.file_path, error
            ),
        }
    }
    Ok(LogDetails::new(&log))
}

#[get("/ledger/<kind>/export?<month>&<year>&<pension_type>")]
pub async fn export(
    conn: Connection<'_, Db>,
    user: AuthUser,
    kind: Result<LedgerKind, LedgerError>,
    month: Option<&str>,
    year: Option<i32>,
    pension_type: Option<&str>,
) -> Result<CsvDownload, ApiResponse<String>> {
    let db = conn.into_inner();
    let AuthUser(claims) = user;
    let (kind, period) = kind
        .and_then(|kind| Ok((kind, Period::from_query(month, year)?)))
        .map_err(|error| ApiError::from(error).reply())?;

    let (entries, new_entrants) = load_period(db, kind, period, pension_type)
        .await
        .map_err(|error| ApiError::from(error).reply())?;
    let body = csv_export::period_csv(kind, period, &entries, new_entrants)
        .map_err(|error| ApiError::from(error).reply())?;

    activity::record(
        db,
        &claims.username,
        ACTION_EXPORT,
        format!("Exported {} for {}", kind, period),
    )
    .await;
    Ok(CsvDownload::new(&csv_export::file_name(kind, period), body))
}

#[get("/ledger/<kind>/logs")]
pub async fn logs(
    conn: Connection<'_, Db>,
    _user: AuthUser,
    kind: Result<LedgerKind, LedgerError>,
) -> ApiResponse<Vec<LogDetails>> {
    let db = conn.into_inner();
    let kind = match kind {
        Ok(kind) => kind,
        Err(error) => return ApiError::from(error).reply(),
    };
    match ledger::list_logs(db, kind).await {
        Ok(logs) => reply(
            RESPONSE_OK,
            "",
            Some(logs.iter().map(LogDetails::new).collect()),
        ),
        Err(error) => {
            let error = ApiError::from(error);
            reply(error.code(), error.public_message(), Some(vec![]))
        }
    }
}
