use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "studios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub description: String,

    /// ISO country code
    pub country: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::anime::Entity> for Entity {
    fn to() -> RelationDef {
        super::anime_studios::Relation::Anime.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::anime_studios::Relation::Studio.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
