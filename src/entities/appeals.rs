use sea_orm::entity::prelude::*;

use crate::domain::{AppealKind, AppealStatus};

/// Rightholder and help appeals share one table, discriminated by `kind`.
/// Columns that only one kind uses are nullable.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "appeals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub kind: AppealKind,

    pub email: String,

    pub message: String,

    /// Help appeals
    pub title: Option<String>,

    /// Rightholder appeals
    pub organization: Option<String>,

    pub contact_person: Option<String>,

    pub release_url: Option<Json>,

    pub document_url: Option<Json>,

    pub explanation: Option<String>,

    pub user_id: Option<i32>,

    pub assigned_id: Option<i32>,

    /// Derived from `appeal_history`
    pub status: AppealStatus,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AssignedId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Assigned,

    #[sea_orm(has_many = "super::appeal_history::Entity")]
    History,
}

impl Related<super::appeal_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
