//! Audit trail of staff actions.
//!
//! Recording is best effort: a failed insert is logged and never fails the
//! request that triggered it.

use crate::sql_stmt::ACTIVITY_STATISTICS;
use chrono::Utc;
use rocket::serde::Serialize;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, Set, Statement,
};
use senior_db_entity::db::activity_log::{self, Column as ActivityColumn, Entity as ActivityLog};
use tracing::warn;

pub const ACTION_LOGIN: &str = "login";
pub const ACTION_LOGIN_FAILED: &str = "login_failed";
pub const ACTION_LOGOUT: &str = "logout";
pub const ACTION_REGISTER_SENIOR: &str = "register_senior";
pub const ACTION_ARCHIVE_SENIOR: &str = "archive_senior";
pub const ACTION_RESTORE_SENIOR: &str = "restore_senior";
pub const ACTION_TOGGLE_ENTRY: &str = "toggle_entry";
pub const ACTION_SAVE_LOG: &str = "save_log";
pub const ACTION_EXPORT: &str = "export";
pub const ACTION_CLEAR_LOGS: &str = "clear_logs";

pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Clone, Debug, PartialEq, FromQueryResult, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionCount {
    pub action: String,
    pub total: i64,
}

pub async fn record<C>(db: &C, username: &str, action: &str, description: impl Into<String>)
where
    C: ConnectionTrait,
{
    let log = activity_log::ActiveModel {
        id: NotSet,
        username: Set(username.to_owned()),
        action: Set(action.to_owned()),
        description: Set(description.into()),
        created_at: Set(Utc::now()),
    };
    if let Err(error) = log.insert(db).await {
        warn!("Failed recording activity '{}' for {}: {:?}", action, username, error);
    }
}

/// One page (1-based) of activity, newest first, and the page count.
pub async fn list<C>(
    db: &C,
    page: u64,
    limit: u64,
    action: Option<&str>,
) -> Result<(u64, Vec<activity_log::Model>), DbErr>
where
    C: ConnectionTrait,
{
    let mut query = ActivityLog::find();
    if let Some(action) = action {
        query = query.filter(ActivityColumn::Action.eq(action));
    }
    let paginator = query
        .order_by_desc(ActivityColumn::CreatedAt)
        .order_by_desc(ActivityColumn::Id)
        .paginate(db, limit.clamp(1, MAX_PAGE_SIZE));

    let total_pages = paginator.num_pages().await?;
    let activities = paginator.fetch_page(page.saturating_sub(1)).await?;
    Ok((total_pages, activities))
}

pub async fn all<C>(db: &C) -> Result<Vec<activity_log::Model>, DbErr>
where
    C: ConnectionTrait,
{
    ActivityLog::find()
        .order_by_desc(ActivityColumn::CreatedAt)
        .order_by_desc(ActivityColumn::Id)
        .all(db)
        .await
}

pub async fn statistics<C>(db: &C) -> Result<Vec<ActionCount>, DbErr>
where
    C: ConnectionTrait,
{
    ActionCount::find_by_statement(Statement::from_string(
        db.get_database_backend(),
        ACTIVITY_STATISTICS.to_owned(),
    ))
    .all(db)
    .await
}

pub async fn clear<C>(db: &C) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let result = ActivityLog::delete_many().exec(db).await?;
    Ok(result.rows_affected)
}
