use sea_orm::entity::prelude::*;

use crate::domain::CommentTarget;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// Text as first posted
    pub content_main: String,

    /// Current text, replaced on edit
    pub content: String,

    pub parent_id: Option<i32>,

    pub is_spoiler: bool,

    pub is_pinned: bool,

    #[sea_orm(unique)]
    pub urlhash: String,

    pub content_type: CommentTarget,

    pub object_id: i32,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl Model {
    #[must_use]
    pub fn is_edited(&self) -> bool {
        self.content != self.content_main
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
