use sea_orm::entity::prelude::*;

use crate::domain::{AnimeStatus, AnimeType, DayOfWeek, Rating, Season};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "anime")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    /// Recomputed from `title` on every save
    pub slug: String,

    #[sea_orm(column_name = "type")]
    pub anime_type: AnimeType,

    pub status: AnimeStatus,

    pub rating: Rating,

    pub season: Season,

    pub description: String,

    pub other_title: Option<String>,

    pub start_date: Date,

    pub end_date: Option<Date>,

    pub release_day_of_week: Option<DayOfWeek>,

    /// Minutes
    pub average_time_episode: Option<i32>,

    pub country: Option<String>,

    pub trailer_url: Option<String>,

    pub director_id: Option<i32>,

    pub is_top: bool,

    pub card_image: Option<String>,

    pub background_image: Option<String>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::directors::Entity",
        from = "Column::DirectorId",
        to = "super::directors::Column::Id",
        on_delete = "SetNull"
    )]
    Director,

    #[sea_orm(has_many = "super::episodes::Entity")]
    Episodes,

    #[sea_orm(has_many = "super::arches::Entity")]
    Arches,
}

impl Related<super::directors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Director.def()
    }
}

impl Related<super::episodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episodes.def()
    }
}

impl Related<super::arches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Arches.def()
    }
}

impl Related<super::genres::Entity> for Entity {
    fn to() -> RelationDef {
        super::anime_genres::Relation::Genre.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::anime_genres::Relation::Anime.def().rev())
    }
}

impl Related<super::studios::Entity> for Entity {
    fn to() -> RelationDef {
        super::anime_studios::Relation::Studio.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::anime_studios::Relation::Anime.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
