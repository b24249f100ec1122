//! Monthly dues and pension ledgers.
//!
//! A period's entries are created lazily: the first time a (kind, month, year)
//! is viewed, every active resident without an entry gets an unsettled one.
//! Residents archived later keep the entries they already have.

use crate::error::LedgerError;
use crate::sql_stmt::FIRST_LEDGER_PERIODS;
use chrono::{DateTime, Datelike, Utc};
use rocket::request::FromParam;
use rocket::serde::{Deserialize, Serialize};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, Set, Statement,
};
use senior_db_entity::db::ledger_entry::{
    self, Column as EntryColumn, Entity as LedgerEntryEntity,
};
use senior_db_entity::db::ledger_log::{self, Column as LogColumn, Entity as LedgerLog};
use senior_db_entity::db::senior::{self, Column as SeniorColumn, Entity as Senior};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use tracing::{info, warn};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 9999;
const TOGGLE_ATTEMPTS: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Display, EnumString)]
#[serde(crate = "rocket::serde")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LedgerKind {
    #[serde(rename = "dues")]
    Dues,
    #[serde(rename = "pension")]
    Pension,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Dues => "dues",
            LedgerKind::Pension => "pension",
        }
    }

    pub fn settled_label(&self) -> &'static str {
        match self {
            LedgerKind::Dues => "Paid",
            LedgerKind::Pension => "Claimed",
        }
    }

    pub fn unsettled_label(&self) -> &'static str {
        match self {
            LedgerKind::Dues => "Unpaid",
            LedgerKind::Pension => "Unclaimed",
        }
    }
}

impl<'a> FromParam<'a> for LedgerKind {
    type Error = LedgerError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        LedgerKind::from_str(param).map_err(|_| LedgerError::UnknownKind(param.to_owned()))
    }
}

/// Looks a month up in the fixed name table. Accepts full names, three letter
/// abbreviations and the numbers 1 to 12.
pub fn month_number(value: &str) -> Option<u32> {
    let value = value.trim();
    if let Ok(number) = value.parse::<u32>() {
        return (1..=12).contains(&number).then_some(number);
    }
    if value.len() < 3 {
        return None;
    }
    let value = value.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| {
            let name = name.to_lowercase();
            name == value || (value.len() == 3 && name.starts_with(&value))
        })
        .map(|index| index as u32 + 1)
}

/// A (month, year) pair. Ordered by year, then month.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Result<Period, LedgerError> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidMonth(month.to_string()));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(LedgerError::InvalidYear(year));
        }
        Ok(Period { year, month })
    }

    pub fn parse(month: &str, year: i32) -> Result<Period, LedgerError> {
        match month_number(month) {
            Some(month) => Period::new(month, year),
            None => Err(LedgerError::InvalidMonth(month.to_owned())),
        }
    }

    /// Period from optional query values, defaulting to the current month.
    pub fn from_query(month: Option<&str>, year: Option<i32>) -> Result<Period, LedgerError> {
        let current = Period::current();
        let year = year.unwrap_or(current.year);
        match month {
            Some(month) => Period::parse(month, year),
            None => Period::new(current.month, year),
        }
    }

    pub fn current() -> Period {
        let today = Utc::now().date_naive();
        Period {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    /// `year * 100 + month`, the same key the first-period query computes.
    pub fn key(&self) -> i32 {
        self.year * 100 + self.month as i32
    }

    fn of_log(log: &ledger_log::Model) -> Option<Period> {
        if log.month < 1 {
            return None;
        }
        Period::new(log.month as u32, log.year).ok()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

/// A ledger entry joined with the resident's display fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct LedgerEntry {
    pub id: i32,
    pub senior_id: i32,
    pub sccn: String,
    pub name: String,
    pub zone: String,
    pub pension_type: Option<String>,
    pub settled: bool,
    pub settled_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    pub fn new(entry: &ledger_entry::Model, senior: &senior::Model) -> LedgerEntry {
        LedgerEntry {
            id: entry.id,
            senior_id: senior.id,
            sccn: senior.sccn.to_owned(),
            name: senior.display_name(),
            zone: senior.zone.to_owned(),
            pension_type: senior.pension_type.to_owned(),
            settled: entry.settled,
            settled_at: entry.settled_at,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct PeriodTotals {
    pub total: i32,
    pub settled: i32,
    pub unsettled: i32,
}

impl PeriodTotals {
    pub fn of(entries: &[LedgerEntry]) -> PeriodTotals {
        let settled = entries.iter().filter(|entry| entry.settled).count() as i32;
        let total = entries.len() as i32;
        PeriodTotals {
            total,
            settled,
            unsettled: total - settled,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct RangeRow {
    pub month: u32,
    pub month_name: &'static str,
    pub year: i32,
    pub total_seniors: i64,
    pub settled: i64,
    pub unsettled: i64,
    pub collection_rate: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct RangeTotals {
    pub periods: usize,
    pub total_seniors: i64,
    pub settled: i64,
    pub unsettled: i64,
    pub collection_rate: String,
    pub rows: Vec<RangeRow>,
}

/// Settled share of `total` as a percentage with two decimals.
pub fn collection_rate(settled: i64, total: i64) -> String {
    if total == 0 {
        return String::from("0.00");
    }
    format!("{:.2}", settled as f64 / total as f64 * 100.0)
}

/// Creates the missing entries for `period`, then returns all of its entries
/// ordered by resident name. `pension_type` narrows the listing only; entries
/// are always created for every active resident.
pub async fn get_or_create_period<C>(
    db: &C,
    kind: LedgerKind,
    period: Period,
    pension_type: Option<&str>,
) -> Result<Vec<LedgerEntry>, LedgerError>
where
    C: ConnectionTrait,
{
    let created = create_missing_entries(db, kind, period).await?;
    if created > 0 {
        info!("Created {} {} entries for {}", created, kind, period);
    }

    let mut query = LedgerEntryEntity::find()
        .find_also_related(Senior)
        .filter(EntryColumn::Kind.eq(kind.as_str()))
        .filter(EntryColumn::Month.eq(period.month as i32))
        .filter(EntryColumn::Year.eq(period.year));
    if let Some(pension_type) = pension_type {
        query = query.filter(SeniorColumn::PensionType.eq(pension_type));
    }
    let rows = query
        .order_by_asc(SeniorColumn::LastName)
        .order_by_asc(SeniorColumn::FirstName)
        .order_by_asc(EntryColumn::Id)
        .all(db)
        .await?;

    Ok(rows
        .iter()
        .filter_map(|(entry, senior)| match senior {
            Some(senior) => Some(LedgerEntry::new(entry, senior)),
            None => {
                warn!("Ledger entry {} has no resident", entry.id);
                None
            }
        })
        .collect())
}

async fn create_missing_entries<C>(
    db: &C,
    kind: LedgerKind,
    period: Period,
) -> Result<u64, LedgerError>
where
    C: ConnectionTrait,
{
    let active = Senior::find()
        .filter(SeniorColumn::Status.eq(senior::STATUS_ACTIVE))
        .all(db)
        .await?;
    let existing: HashSet<i32> = LedgerEntryEntity::find()
        .filter(EntryColumn::Kind.eq(kind.as_str()))
        .filter(EntryColumn::Month.eq(period.month as i32))
        .filter(EntryColumn::Year.eq(period.year))
        .all(db)
        .await?
        .into_iter()
        .map(|entry| entry.senior_id)
        .collect();

    let now = Utc::now();
    let missing: Vec<ledger_entry::ActiveModel> = active
        .iter()
        .filter(|senior| !existing.contains(&senior.id))
        .map(|senior| ledger_entry::ActiveModel {
            id: NotSet,
            kind: Set(kind.as_str().to_owned()),
            senior_id: Set(senior.id),
            month: Set(period.month as i32),
            year: Set(period.year),
            settled: Set(false),
            settled_at: Set(None),
            created_at: Set(now),
        })
        .collect();
    if missing.is_empty() {
        return Ok(0);
    }

    // a concurrent first view of the same period may already have inserted some rows
    let inserted = LedgerEntryEntity::insert_many(missing)
        .on_conflict(
            OnConflict::columns([
                EntryColumn::Kind,
                EntryColumn::SeniorId,
                EntryColumn::Month,
                EntryColumn::Year,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(inserted)
}

pub async fn find_entry<C>(db: &C, id: i32) -> Result<Option<LedgerEntry>, LedgerError>
where
    C: ConnectionTrait,
{
    let row = LedgerEntryEntity::find_by_id(id)
        .find_also_related(Senior)
        .one(db)
        .await?;
    Ok(match row {
        Some((entry, Some(senior))) => Some(LedgerEntry::new(&entry, &senior)),
        _ => None,
    })
}

/// Flips the settled flag of an entry. The timestamp is written in the same
/// statement and is cleared when the flag goes back to false. Returns false
/// when no entry has this id.
pub async fn toggle_entry<C>(db: &C, id: i32) -> Result<bool, LedgerError>
where
    C: ConnectionTrait,
{
    for _ in 0..TOGGLE_ATTEMPTS {
        let entry = match LedgerEntryEntity::find_by_id(id).one(db).await? {
            Some(entry) => entry,
            None => return Ok(false),
        };
        let settled = !entry.settled;
        let settled_at = if settled { Some(Utc::now()) } else { None };

        let result = LedgerEntryEntity::update_many()
            .col_expr(EntryColumn::Settled, Expr::value(settled))
            .col_expr(EntryColumn::SettledAt, Expr::value(settled_at))
            .filter(EntryColumn::Id.eq(id))
            .filter(EntryColumn::Settled.eq(entry.settled))
            .exec(db)
            .await?;
        if result.rows_affected > 0 {
            return Ok(true);
        }
        warn!("Ledger entry {} changed while toggling, retrying", id);
    }
    Err(LedgerError::Contended(id))
}

#[derive(Debug, FromQueryResult)]
struct FirstLedgerPeriod {
    kind: String,
    first_period: i32,
}

/// Residents whose earliest entry of this kind falls exactly on `period`.
pub async fn count_new_entrants<C>(
    db: &C,
    kind: LedgerKind,
    period: Period,
) -> Result<u64, LedgerError>
where
    C: ConnectionTrait,
{
    let rows = FirstLedgerPeriod::find_by_statement(Statement::from_string(
        db.get_database_backend(),
        FIRST_LEDGER_PERIODS.to_owned(),
    ))
    .all(db)
    .await?;

    Ok(rows
        .iter()
        .filter(|row| row.kind == kind.as_str() && row.first_period == period.key())
        .count() as u64)
}

/// Totals of a period as currently stored, without creating entries.
pub async fn peek_period_totals<C>(
    db: &C,
    kind: LedgerKind,
    period: Period,
) -> Result<PeriodTotals, LedgerError>
where
    C: ConnectionTrait,
{
    let entries = LedgerEntryEntity::find()
        .filter(EntryColumn::Kind.eq(kind.as_str()))
        .filter(EntryColumn::Month.eq(period.month as i32))
        .filter(EntryColumn::Year.eq(period.year))
        .all(db)
        .await?;
    let settled = entries.iter().filter(|entry| entry.settled).count() as i32;
    Ok(PeriodTotals {
        total: entries.len() as i32,
        settled,
        unsettled: entries.len() as i32 - settled,
    })
}

pub async fn find_log<C>(
    db: &C,
    kind: LedgerKind,
    period: Period,
) -> Result<Option<ledger_log::Model>, LedgerError>
where
    C: ConnectionTrait,
{
    Ok(LedgerLog::find()
        .filter(LogColumn::Kind.eq(kind.as_str()))
        .filter(LogColumn::Month.eq(period.month as i32))
        .filter(LogColumn::Year.eq(period.year))
        .one(db)
        .await?)
}

pub async fn list_logs<C>(db: &C, kind: LedgerKind) -> Result<Vec<ledger_log::Model>, LedgerError>
where
    C: ConnectionTrait,
{
    Ok(LedgerLog::find()
        .filter(LogColumn::Kind.eq(kind.as_str()))
        .order_by_desc(LogColumn::Year)
        .order_by_desc(LogColumn::Month)
        .all(db)
        .await?)
}

/// Inserts or replaces the log row of a period.
pub async fn save_log<C>(
    db: &C,
    kind: LedgerKind,
    period: Period,
    file_path: &str,
    totals: PeriodTotals,
    new_entrants: u64,
    notes: Option<String>,
) -> Result<ledger_log::Model, LedgerError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let log = ledger_log::ActiveModel {
        id: NotSet,
        kind: Set(kind.as_str().to_owned()),
        month: Set(period.month as i32),
        year: Set(period.year),
        file_path: Set(file_path.to_owned()),
        total_seniors: Set(totals.total),
        settled: Set(totals.settled),
        unsettled: Set(totals.unsettled),
        new_entrants: Set(i32::try_from(new_entrants).unwrap_or(i32::MAX)),
        notes: Set(notes),
        created_at: Set(now),
        updated_at: Set(now),
    };

    LedgerLog::insert(log)
        .on_conflict(
            OnConflict::columns([LogColumn::Kind, LogColumn::Month, LogColumn::Year])
                .update_columns([
                    LogColumn::FilePath,
                    LogColumn::TotalSeniors,
                    LogColumn::Settled,
                    LogColumn::Unsettled,
                    LogColumn::NewEntrants,
                    LogColumn::Notes,
                    LogColumn::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    match find_log(db, kind, period).await? {
        Some(log) => Ok(log),
        None => Err(LedgerError::Db(sea_orm::DbErr::RecordNotFound(format!(
            "{} log for {}",
            kind, period
        )))),
    }
}

/// Sums the logs of `kind` whose period lies in `from..=to`. An inverted
/// range matches nothing.
pub fn aggregate_over_range(
    kind: LedgerKind,
    logs: &[ledger_log::Model],
    from: Period,
    to: Period,
) -> RangeTotals {
    let mut selected: Vec<(Period, &ledger_log::Model)> = logs
        .iter()
        .filter(|log| log.kind == kind.as_str())
        .filter_map(|log| Period::of_log(log).map(|period| (period, log)))
        .filter(|(period, _)| from <= *period && *period <= to)
        .collect();
    selected.sort_by_key(|(period, _)| *period);

    let mut total_seniors = 0i64;
    let mut settled = 0i64;
    let mut unsettled = 0i64;
    let mut rows = Vec::with_capacity(selected.len());
    for (period, log) in &selected {
        total_seniors += log.total_seniors as i64;
        settled += log.settled as i64;
        unsettled += log.unsettled as i64;
        rows.push(RangeRow {
            month: period.month,
            month_name: period.month_name(),
            year: period.year,
            total_seniors: log.total_seniors as i64,
            settled: log.settled as i64,
            unsettled: log.unsettled as i64,
            collection_rate: collection_rate(log.settled as i64, log.total_seniors as i64),
        });
    }

    RangeTotals {
        periods: rows.len(),
        total_seniors,
        settled,
        unsettled,
        collection_rate: collection_rate(settled, total_seniors),
        rows,
    }
}

pub async fn range_totals<C>(
    db: &C,
    kind: LedgerKind,
    from: Period,
    to: Period,
) -> Result<RangeTotals, LedgerError>
where
    C: ConnectionTrait,
{
    if from > to {
        return Err(LedgerError::InvalidRange {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    let logs = list_logs(db, kind).await?;
    Ok(aggregate_over_range(kind, &logs, from, to))
}
