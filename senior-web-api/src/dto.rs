use crate::ledger::{collection_rate, LedgerEntry, LedgerKind, Period, PeriodTotals};
use chrono::{DateTime, NaiveDate, Utc};
use rocket::http::{Header, Status};
use rocket::serde::{json::Json, Deserialize, Serialize};
use senior_db_entity::db::activity_log::Model as ActivityLogModel;
use senior_db_entity::db::app_user::Model as UserModel;
use senior_db_entity::db::ledger_log::Model as LedgerLogModel;
use senior_db_entity::db::senior::Model as SeniorModel;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ResponseData<T> {
    pub code: Option<u16>,
    #[serde(rename = "statusCode")]
    pub status_code: Option<u16>,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ResponseData<T> {
    pub fn new(code: u16, message: String, data: Option<T>) -> ResponseData<T> {
        ResponseData {
            code: Some(code),
            status_code: None,
            message,
            data,
        }
    }
}

pub const RESPONSE_OK: u16 = 200;
pub const RESPONSE_BAD_REQUEST: u16 = 400;
pub const RESPONSE_UNAUTHORIZED: u16 = 401;
pub const RESPONSE_FORBIDDEN: u16 = 403;
pub const RESPONSE_NOT_FOUND: u16 = 404;
pub const RESPONSE_UNPROCESSABLE: u16 = 422;
pub const RESPONSE_INTERNAL_ERROR: u16 = 500;
pub const RESPONSE_UNAVAILABLE: u16 = 503;

pub type ApiResponse<T> = (Status, Json<ResponseData<T>>);

/// Envelope with a matching HTTP status.
pub fn reply<T>(code: u16, message: impl Into<String>, data: Option<T>) -> ApiResponse<T> {
    let status = Status::from_code(code).unwrap_or(Status::InternalServerError);
    (status, Json(ResponseData::new(code, message.into(), data)))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub enum AccessLevel {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "staff")]
    Staff,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub access_level: Option<AccessLevel>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub is_admin: bool,
    pub expiry: DateTime<Utc>,
}

impl LoginResponse {
    pub fn new(user: &UserModel, token: String, expiry: DateTime<Utc>) -> LoginResponse {
        LoginResponse {
            token,
            username: user.username.to_owned(),
            full_name: user.full_name.to_owned(),
            role: user.role.to_owned(),
            is_admin: user.is_admin,
            expiry,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SeniorRequest {
    pub sccn: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub sex: String,
    pub zone: String,
    pub contact_number: Option<String>,
    pub pension_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SeniorDetails {
    pub id: i32,
    pub sccn: String,
    pub name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub sex: String,
    pub zone: String,
    pub contact_number: Option<String>,
    pub pension_type: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl SeniorDetails {
    pub fn new(senior: &SeniorModel) -> SeniorDetails {
        SeniorDetails {
            id: senior.id,
            sccn: senior.sccn.to_owned(),
            name: senior.display_name(),
            first_name: senior.first_name.to_owned(),
            middle_name: senior.middle_name.to_owned(),
            last_name: senior.last_name.to_owned(),
            birth_date: senior.birth_date,
            sex: senior.sex.to_owned(),
            zone: senior.zone.to_owned(),
            contact_number: senior.contact_number.to_owned(),
            pension_type: senior.pension_type.to_owned(),
            status: senior.status.to_owned(),
            created_at: senior.created_at,
            archived_at: senior.archived_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct PeriodView {
    pub kind: LedgerKind,
    pub month: u32,
    pub month_name: &'static str,
    pub year: i32,
    pub settled_label: &'static str,
    pub unsettled_label: &'static str,
    pub entries: Vec<LedgerEntry>,
    pub totals: PeriodTotals,
    pub new_entrants: u64,
    pub collection_rate: String,
}

impl PeriodView {
    pub fn new(
        kind: LedgerKind,
        period: Period,
        entries: Vec<LedgerEntry>,
        new_entrants: u64,
    ) -> PeriodView {
        let totals = PeriodTotals::of(&entries);
        PeriodView {
            kind,
            month: period.month,
            month_name: period.month_name(),
            year: period.year,
            settled_label: kind.settled_label(),
            unsettled_label: kind.unsettled_label(),
            entries,
            totals,
            new_entrants,
            collection_rate: collection_rate(totals.settled as i64, totals.total as i64),
        }
    }

    /// Rendered when the ledger cannot be loaded.
    pub fn empty(kind: LedgerKind, period: Period) -> PeriodView {
        PeriodView::new(kind, period, vec![], 0)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SaveLogRequest {
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct LogDetails {
    pub id: i32,
    pub kind: String,
    pub month: i32,
    pub month_name: Option<&'static str>,
    pub year: i32,
    pub file_path: String,
    pub total_seniors: i32,
    pub settled: i32,
    pub unsettled: i32,
    pub new_entrants: i32,
    pub collection_rate: String,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl LogDetails {
    pub fn new(log: &LedgerLogModel) -> LogDetails {
        LogDetails {
            id: log.id,
            kind: log.kind.to_owned(),
            month: log.month,
            month_name: Period::new(log.month.max(0) as u32, log.year)
                .ok()
                .map(|period| period.month_name()),
            year: log.year,
            file_path: log.file_path.to_owned(),
            total_seniors: log.total_seniors,
            settled: log.settled,
            unsettled: log.unsettled,
            new_entrants: log.new_entrants,
            collection_rate: collection_rate(log.settled as i64, log.total_seniors as i64),
            notes: log.notes.to_owned(),
            updated_at: log.updated_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActivityDetails {
    pub id: i32,
    pub username: String,
    pub action: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityDetails {
    pub fn new(log: &ActivityLogModel) -> ActivityDetails {
        ActivityDetails {
            id: log.id,
            username: log.username.to_owned(),
            action: log.action.to_owned(),
            description: log.description.to_owned(),
            created_at: log.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActivityPage {
    pub total_pages: u64,
    pub activities: Vec<ActivityDetails>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Dashboard {
    pub active_seniors: i64,
    pub archived_seniors: i64,
    pub month_name: &'static str,
    pub year: i32,
    pub dues: PeriodTotals,
    pub dues_collection_rate: String,
    pub pension: PeriodTotals,
    pub pension_claim_rate: String,
}

/// CSV body served as a file download.
#[derive(Responder)]
#[response(content_type = "text/csv")]
pub struct CsvDownload {
    body: String,
    disposition: Header<'static>,
}

impl CsvDownload {
    pub fn new(file_name: &str, body: String) -> CsvDownload {
        CsvDownload {
            body,
            disposition: Header::new(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", file_name),
            ),
        }
    }
}
