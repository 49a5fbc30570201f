use sea_orm::entity::prelude::*;

use crate::domain::{AppealEvent, AppealStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "appeal_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub appeal_id: i32,

    pub event: AppealEvent,

    pub message: String,

    pub status: Option<AppealStatus>,

    pub user_id: Option<i32>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::appeals::Entity",
        from = "Column::AppealId",
        to = "super::appeals::Column::Id",
        on_delete = "Cascade"
    )]
    Appeal,

    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::appeals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appeal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
