use sea_orm::entity::prelude::*;

use crate::domain::{VoiceoverEvent, VoiceoverStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "voiceover_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub voiceover_id: i32,

    pub event: VoiceoverEvent,

    pub message: String,

    /// Set only when this event moved the voiceover to a new status
    pub status: Option<VoiceoverStatus>,

    pub user_id: Option<i32>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::voiceovers::Entity",
        from = "Column::VoiceoverId",
        to = "super::voiceovers::Column::Id",
        on_delete = "Cascade"
    )]
    Voiceover,

    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::voiceovers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Voiceover.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
