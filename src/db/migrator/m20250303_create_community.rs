use crate::entities::prelude::*;
use crate::entities::{comment_reactions, comments, user_anime, user_episode_viewed};
use sea_orm_migration::prelude::*;

use super::{create_entity_table, create_unique_index, drop_entity_table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, Comments).await?;
        create_entity_table(manager, CommentReactions).await?;
        create_entity_table(manager, UserAnime).await?;
        create_entity_table(manager, UserEpisodeViewed).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_target")
                    .table(Comments)
                    .col(comments::Column::ContentType)
                    .col(comments::Column::ObjectId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        create_unique_index(
            manager,
            "uq_comment_reactions_user_comment",
            CommentReactions,
            [
                comment_reactions::Column::UserId,
                comment_reactions::Column::CommentId,
            ],
        )
        .await?;

        create_unique_index(
            manager,
            "uq_user_anime_user_action_anime",
            UserAnime,
            [
                user_anime::Column::UserId,
                user_anime::Column::Action,
                user_anime::Column::AnimeId,
            ],
        )
        .await?;

        create_unique_index(
            manager,
            "uq_user_episode_viewed_user_episode",
            UserEpisodeViewed,
            [
                user_episode_viewed::Column::UserId,
                user_episode_viewed::Column::EpisodeId,
            ],
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, UserEpisodeViewed).await?;
        drop_entity_table(manager, UserAnime).await?;
        drop_entity_table(manager, CommentReactions).await?;
        drop_entity_table(manager, Comments).await
    }
}
