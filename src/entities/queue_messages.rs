use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "queue_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub queue_name: String,

    pub body: String,

    /// Rotated on every receive
    pub receipt_handle: Option<String>,

    /// Hidden from receivers until this instant
    pub visible_at: DateTimeUtc,

    pub receive_count: i32,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
