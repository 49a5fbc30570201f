use sea_orm::entity::prelude::*;

use crate::domain::EpisodeStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "episodes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub anime_id: i32,

    pub arch_id: Option<i32>,

    pub title: String,

    /// Unique per anime
    pub order: i32,

    pub status: EpisodeStatus,

    pub release_date: Option<Date>,

    pub is_accessible: bool,

    /// Opening/ending bounds in seconds from the start of the episode
    pub start_opening: Option<i32>,

    pub end_opening: Option<i32>,

    pub start_ending: Option<i32>,

    pub end_ending: Option<i32>,

    pub preview_image: Option<String>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::anime::Entity",
        from = "Column::AnimeId",
        to = "super::anime::Column::Id",
        on_delete = "Cascade"
    )]
    Anime,

    #[sea_orm(
        belongs_to = "super::arches::Entity",
        from = "Column::ArchId",
        to = "super::arches::Column::Id",
        on_delete = "SetNull"
    )]
    Arch,

    #[sea_orm(has_many = "super::voiceovers::Entity")]
    Voiceovers,
}

impl Related<super::anime::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Anime.def()
    }
}

impl Related<super::arches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Arch.def()
    }
}

impl Related<super::voiceovers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Voiceovers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
