use sea_orm::entity::prelude::*;

/// One resident's paid (dues) or claimed (pension) record for a month/year.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entry")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub kind: String,
    pub senior_id: i32,
    pub month: i32,
    pub year: i32,
    pub settled: bool,
    pub settled_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::senior::Entity",
        from = "Column::SeniorId",
        to = "super::senior::Column::Id"
    )]
    Senior,
}

impl Related<super::senior::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Senior.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
