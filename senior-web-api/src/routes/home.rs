use crate::auth::AuthUser;
use crate::dto::{reply, ApiResponse, Dashboard, RESPONSE_OK};
use crate::error::ApiError;
use crate::ledger::{self, collection_rate, LedgerKind, Period};
use crate::pool::Db;
use crate::registry;
use sea_orm::DatabaseConnection;
use sea_orm_rocket::Connection;

async fn load_dashboard(db: &DatabaseConnection) -> Result<Dashboard, ApiError> {
    let period = Period::current();
    let (active_seniors, archived_seniors) = registry::status_counts(db).await?;
    let dues = ledger::peek_period_totals(db, LedgerKind::Dues, period).await?;
    let pension = ledger::peek_period_totals(db, LedgerKind::Pension, period).await?;

    Ok(Dashboard {
        active_seniors,
        archived_seniors,
        month_name: period.month_name(),
        year: period.year,
        dues,
        dues_collection_rate: collection_rate(dues.settled as i64, dues.total as i64),
        pension,
        pension_claim_rate: collection_rate(pension.settled as i64, pension.total as i64),
    })
}

/// Counts for the landing page. Viewing it never creates ledger entries.
#[get("/dashboard")]
pub async fn dashboard(conn: Connection<'_, Db>, _user: AuthUser) -> ApiResponse<Dashboard> {
    let db = conn.into_inner();
    match load_dashboard(db).await {
        Ok(dashboard) => reply(RESPONSE_OK, "", Some(dashboard)),
        Err(error) => error.reply(),
    }
}
