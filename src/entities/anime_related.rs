use sea_orm::entity::prelude::*;

/// Symmetric link between two anime; both directions are stored.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "anime_related")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub anime_id: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub related_id: i32,
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
        belongs_to = "super::anime::Entity",
        from = "Column::RelatedId",
        to = "super::anime::Column::Id",
        on_delete = "Cascade"
    )]
    Related,
}

impl ActiveModelBehavior for ActiveModel {}
