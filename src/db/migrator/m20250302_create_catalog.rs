use crate::entities::prelude::*;
use crate::entities::{arches, episodes};
use sea_orm_migration::prelude::*;

use super::{create_entity_table, create_unique_index, drop_entity_table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, Directors).await?;
        create_entity_table(manager, Genres).await?;
        create_entity_table(manager, Studios).await?;
        create_entity_table(manager, Anime).await?;
        create_entity_table(manager, AnimeGenres).await?;
        create_entity_table(manager, AnimeStudios).await?;
        create_entity_table(manager, AnimeRelated).await?;
        create_entity_table(manager, AnimeHistory).await?;
        create_entity_table(manager, AnimeReactions).await?;
        create_entity_table(manager, Arches).await?;
        create_entity_table(manager, Episodes).await?;
        create_entity_table(manager, PreviewImages).await?;
        create_entity_table(manager, Posters).await?;
        create_entity_table(manager, Voiceovers).await?;
        create_entity_table(manager, VoiceoverHistory).await?;

        create_unique_index(
            manager,
            "uq_episodes_anime_order",
            Episodes,
            [episodes::Column::AnimeId, episodes::Column::Order],
        )
        .await?;

        create_unique_index(
            manager,
            "uq_arches_anime_order",
            Arches,
            [arches::Column::AnimeId, arches::Column::Order],
        )
        .await?;

        create_unique_index(
            manager,
            "uq_anime_reactions_user_anime",
            AnimeReactions,
            [
                crate::entities::anime_reactions::Column::UserId,
                crate::entities::anime_reactions::Column::AnimeId,
            ],
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, VoiceoverHistory).await?;
        drop_entity_table(manager, Voiceovers).await?;
        drop_entity_table(manager, Posters).await?;
        drop_entity_table(manager, PreviewImages).await?;
        drop_entity_table(manager, Episodes).await?;
        drop_entity_table(manager, Arches).await?;
        drop_entity_table(manager, AnimeReactions).await?;
        drop_entity_table(manager, AnimeHistory).await?;
        drop_entity_table(manager, AnimeRelated).await?;
        drop_entity_table(manager, AnimeStudios).await?;
        drop_entity_table(manager, AnimeGenres).await?;
        drop_entity_table(manager, Anime).await?;
        drop_entity_table(manager, Studios).await?;
        drop_entity_table(manager, Genres).await?;
        drop_entity_table(manager, Directors).await
    }
}
