use crate::dto::SeniorRequest;
use crate::error::ApiError;
use crate::sql_stmt::SENIOR_STATUS_COUNTS;
use crate::validation::validate_senior;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    FromQueryResult, IntoActiveModel, QueryFilter, QueryOrder, Set, Statement,
};
use senior_db_entity::db::senior::{self, Column as SeniorColumn, Entity as Senior};

#[derive(Debug, FromQueryResult)]
struct StatusCount {
    status: String,
    total: i64,
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

pub async fn list<C>(
    db: &C,
    status: Option<&str>,
    zone: Option<&str>,
) -> Result<Vec<senior::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let mut query = Senior::find();
    if let Some(status) = status {
        query = query.filter(SeniorColumn::Status.eq(status));
    }
    if let Some(zone) = zone {
        query = query.filter(SeniorColumn::Zone.eq(zone));
    }
    query
        .order_by_asc(SeniorColumn::LastName)
        .order_by_asc(SeniorColumn::FirstName)
        .all(db)
        .await
}

pub async fn find<C>(db: &C, id: i32) -> Result<Option<senior::Model>, DbErr>
where
    C: ConnectionTrait,
{
    Senior::find_by_id(id).one(db).await
}

pub async fn register<C>(db: &C, request: &SeniorRequest) -> Result<senior::Model, ApiError>
where
    C: ConnectionTrait,
{
    validate_senior(request, Utc::now().date_naive())?;

    let sccn = request.sccn.trim();
    if find_by_sccn(db, sccn).await?.is_some() {
        return Err(duplicate_sccn(sccn));
    }
    insert(db, request).await
}

fn duplicate_sccn(sccn: &str) -> ApiError {
    ApiError::Conflict(format!(
        "A resident with SCCN {} is already registered",
        sccn
    ))
}

async fn find_by_sccn<C>(db: &C, sccn: &str) -> Result<Option<senior::Model>, DbErr>
where
    C: ConnectionTrait,
{
    Senior::find()
        .filter(SeniorColumn::Sccn.eq(sccn))
        .one(db)
        .await
}

/// Inserts a validated registration. A failed insert whose SCCN is now taken
/// lost a race with a concurrent registration and is reported as a conflict.
async fn insert<C>(db: &C, request: &SeniorRequest) -> Result<senior::Model, ApiError>
where
    C: ConnectionTrait,
{
    let sccn = request.sccn.trim();
    let senior = senior::ActiveModel {
        id: NotSet,
        sccn: Set(sccn.to_owned()),
        first_name: Set(request.first_name.trim().to_owned()),
        middle_name: Set(optional(&request.middle_name)),
        last_name: Set(request.last_name.trim().to_owned()),
        birth_date: Set(request.birth_date),
        sex: Set(request.sex.trim().to_owned()),
        zone: Set(request.zone.trim().to_owned()),
        contact_number: Set(optional(&request.contact_number)),
        pension_type: Set(optional(&request.pension_type)),
        status: Set(senior::STATUS_ACTIVE.to_owned()),
        created_at: Set(Utc::now()),
        archived_at: Set(None),
    };
    match senior.insert(db).await {
        Ok(senior) => Ok(senior),
        Err(error) => match find_by_sccn(db, sccn).await {
            Ok(Some(_)) => Err(duplicate_sccn(sccn)),
            _ => Err(error.into()),
        },
    }
}

/// Moves a resident between active and archived. Ledger entries are never
/// touched. `None` when the id is unknown.
pub async fn set_status<C>(
    db: &C,
    id: i32,
    status: &str,
) -> Result<Option<senior::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let senior = match Senior::find_by_id(id).one(db).await? {
        Some(senior) => senior,
        None => return Ok(None),
    };
    if senior.status == status {
        return Ok(Some(senior));
    }

    let mut active = senior.into_active_model();
    active.status = Set(status.to_owned());
    active.archived_at = Set(if status == senior::STATUS_ARCHIVED {
        Some(Utc::now())
    } else {
        None
    });
    Ok(Some(active.update(db).await?))
}

/// (active, archived) resident counts.
pub async fn status_counts<C>(db: &C) -> Result<(i64, i64), DbErr>
where
    C: ConnectionTrait,
{
    let rows = StatusCount::find_by_statement(Statement::from_string(
        db.get_database_backend(),
        SENIOR_STATUS_COUNTS.to_owned(),
    ))
    .all(db)
    .await?;

    let count = |status: &str| {
        rows.iter()
            .filter(|row| row.status == status)
            .map(|row| row.total)
            .sum::<i64>()
    };
    Ok((count(senior::STATUS_ACTIVE), count(senior::STATUS_ARCHIVED)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::test_utils::setup_db;

    fn request(sccn: &str, last_name: &str) -> SeniorRequest {
        SeniorRequest {
            sccn: sccn.to_owned(),
            first_name: " Rosa ".to_owned(),
            middle_name: Some(String::new()),
            last_name: last_name.to_owned(),
            birth_date: NaiveDate::from_ymd_opt(1948, 7, 2).unwrap(),
            sex: "F".to_owned(),
            zone: "Zone 1".to_owned(),
            contact_number: None,
            pension_type: Some("Social Pension".to_owned()),
        }
    }

    #[tokio::test]
    async fn registration_trims_input_and_starts_active() {
        let db = setup_db().await;
        let senior = register(&db, &request("600000000001", "Salazar"))
            .await
            .unwrap();

        assert_eq!(senior.first_name, "Rosa");
        assert_eq!(senior.middle_name, None);
        assert!(senior.is_active());
        assert_eq!(senior.display_name(), "Salazar, Rosa");
    }

    #[tokio::test]
    async fn duplicate_sccn_is_a_conflict() {
        let db = setup_db().await;
        register(&db, &request("600000000002", "Torres"))
            .await
            .unwrap();

        let duplicate = register(&db, &request("600000000002", "Aguilar")).await;
        assert!(matches!(duplicate, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn unique_violation_on_insert_is_a_conflict() {
        let db = setup_db().await;
        insert(&db, &request("600000000004", "Torres")).await.unwrap();

        // a registration that passed the lookup before the other one landed
        let late = insert(&db, &request("600000000004", "Aguilar")).await;
        assert!(matches!(late, Err(ApiError::Conflict(_))));
        assert_eq!(list(&db, None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_registration_is_rejected_before_insert() {
        let db = setup_db().await;
        let invalid = register(&db, &request("6000", "Torres")).await;

        assert!(matches!(invalid, Err(ApiError::Validation(_))));
        assert!(list(&db, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn archive_and_restore_round_trip() {
        let db = setup_db().await;
        let senior = register(&db, &request("600000000003", "Rivera"))
            .await
            .unwrap();

        let archived = set_status(&db, senior.id, senior::STATUS_ARCHIVED)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(archived.status, senior::STATUS_ARCHIVED);
        assert!(archived.archived_at.is_some());
        assert_eq!(status_counts(&db).await.unwrap(), (0, 1));

        let restored = set_status(&db, senior.id, senior::STATUS_ACTIVE)
            .await
            .unwrap()
            .unwrap();
        assert!(restored.archived_at.is_none());
        assert_eq!(
            list(&db, Some(senior::STATUS_ACTIVE), Some("Zone 1"))
                .await
                .unwrap()
                .len(),
            1
        );

        assert!(set_status(&db, 404, senior::STATUS_ARCHIVED)
            .await
            .unwrap()
            .is_none());
    }
}
