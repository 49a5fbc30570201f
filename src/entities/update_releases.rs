use sea_orm::entity::prelude::*;

use crate::domain::ReleaseSource;

/// Raw payload fetched from an external catalog.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "update_releases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub source: ReleaseSource,

    pub user_id: Option<i32>,

    pub content: Json,

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
}

impl ActiveModelBehavior for ActiveModel {}
