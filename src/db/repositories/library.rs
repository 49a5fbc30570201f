use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::db::{Page, PageRequest, fetch_page};
use crate::domain::{AnimeType, UserAnimeAction};
use crate::entities::{anime, anime_genres, user_anime, user_episode_viewed};

#[derive(Debug, Clone, Default)]
pub struct UserAnimeFilter {
    pub action: Option<UserAnimeAction>,
    pub genre_id: Option<i32>,
    pub anime_type: Option<AnimeType>,
    pub name: Option<String>,
}

/// Whether an idempotent insert produced a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added {
    Created,
    Existing,
}

pub struct LibraryRepository {
    conn: DatabaseConnection,
}

impl LibraryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// The user's marked anime with the anime row attached, newest mark first.
    pub async fn list(
        &self,
        user_id: i32,
        filter: &UserAnimeFilter,
        request: PageRequest,
    ) -> Result<Page<(user_anime::Model, anime::Model)>> {
        let mut anime_cond = Condition::all();
        if let Some(genre_id) = filter.genre_id {
            anime_cond = anime_cond.add(
                anime::Column::Id.in_subquery(
                    Query::select()
                        .column(anime_genres::Column::AnimeId)
                        .from(anime_genres::Entity)
                        .and_where(Expr::col(anime_genres::Column::GenreId).eq(genre_id))
                        .to_owned(),
                ),
            );
        }
        if let Some(anime_type) = filter.anime_type {
            anime_cond = anime_cond.add(anime::Column::AnimeType.eq(anime_type));
        }
        if let Some(name) = filter.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            anime_cond = anime_cond.add(
                Expr::expr(Func::lower(Expr::col((anime::Entity, anime::Column::Title))))
                    .like(format!("%{}%", name.to_lowercase())),
            );
        }

        let mut select = user_anime::Entity::find()
            .filter(user_anime::Column::UserId.eq(user_id))
            .filter(
                user_anime::Column::AnimeId.in_subquery(
                    Query::select()
                        .column(anime::Column::Id)
                        .from(anime::Entity)
                        .cond_where(anime_cond)
                        .to_owned(),
                ),
            )
            .order_by_desc(user_anime::Column::CreatedAt)
            .order_by_desc(user_anime::Column::Id);
        if let Some(action) = filter.action {
            select = select.filter(user_anime::Column::Action.eq(action));
        }

        let page = fetch_page(&self.conn, select, request).await?;

        let ids: Vec<i32> = page.items.iter().map(|row| row.anime_id).collect();
        let anime_rows = if ids.is_empty() {
            Vec::new()
        } else {
            anime::Entity::find()
                .filter(anime::Column::Id.is_in(ids))
                .all(&self.conn)
                .await
                .context("Failed to load marked anime")?
        };

        let Page {
            items,
            count,
            page,
            page_size,
        } = page;
        let items = items
            .into_iter()
            .filter_map(|mark| {
                anime_rows
                    .iter()
                    .find(|a| a.id == mark.anime_id)
                    .cloned()
                    .map(|a| (mark, a))
            })
            .collect();

        Ok(Page {
            items,
            count,
            page,
            page_size,
        })
    }

    pub async fn add(&self, user_id: i32, anime_id: i32, action: UserAnimeAction) -> Result<Added> {
        let exists = user_anime::Entity::find()
            .filter(user_anime::Column::UserId.eq(user_id))
            .filter(user_anime::Column::AnimeId.eq(anime_id))
            .filter(user_anime::Column::Action.eq(action))
            .count(&self.conn)
            .await
            .context("Failed to check user anime")?;
        if exists > 0 {
            return Ok(Added::Existing);
        }

        user_anime::ActiveModel {
            user_id: Set(user_id),
            anime_id: Set(anime_id),
            action: Set(action),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user anime")?;

        Ok(Added::Created)
    }

    /// Removes the marks of one anime, all actions when `action` is `None`.
    pub async fn remove(
        &self,
        user_id: i32,
        anime_id: i32,
        action: Option<UserAnimeAction>,
    ) -> Result<u64> {
        let mut delete = user_anime::Entity::delete_many()
            .filter(user_anime::Column::UserId.eq(user_id))
            .filter(user_anime::Column::AnimeId.eq(anime_id));
        if let Some(action) = action {
            delete = delete.filter(user_anime::Column::Action.eq(action));
        }
        let result = delete
            .exec(&self.conn)
            .await
            .context("Failed to delete user anime")?;
        Ok(result.rows_affected)
    }

    pub async fn mark_episode_viewed(&self, user_id: i32, episode_id: i32) -> Result<Added> {
        let exists = user_episode_viewed::Entity::find()
            .filter(user_episode_viewed::Column::UserId.eq(user_id))
            .filter(user_episode_viewed::Column::EpisodeId.eq(episode_id))
            .count(&self.conn)
            .await
            .context("Failed to check viewed episode")?;
        if exists > 0 {
            return Ok(Added::Existing);
        }

        user_episode_viewed::ActiveModel {
            user_id: Set(user_id),
            episode_id: Set(episode_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert viewed episode")?;

        Ok(Added::Created)
    }

    pub async fn count_viewed_anime(&self, user_id: i32) -> Result<u64> {
        user_anime::Entity::find()
            .filter(user_anime::Column::UserId.eq(user_id))
            .filter(user_anime::Column::Action.eq(UserAnimeAction::Viewed))
            .select_only()
            .column(user_anime::Column::AnimeId)
            .count(&self.conn)
            .await
            .context("Failed to count viewed anime")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::db::Store;
    use crate::db::repositories::catalog::tests::sample_input;
    use crate::db::repositories::user::NewUser;

    #[tokio::test]
    async fn marks_are_idempotent_and_filterable() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let user = store
            .users()
            .create(
                NewUser {
                    username: "viewer".into(),
                    email: "v@example.com".into(),
                    password: "pw".into(),
                    ..Default::default()
                },
                &SecurityConfig {
                    argon2_memory_cost_kib: 1024,
                    argon2_time_cost: 1,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let naruto = store.catalog().create_anime(sample_input("Naruto")).await.unwrap();
        let bleach = store.catalog().create_anime(sample_input("Bleach")).await.unwrap();
        let repo = store.library();

        assert_eq!(
            repo.add(user.id, naruto.id, UserAnimeAction::Viewed).await.unwrap(),
            Added::Created
        );
        assert_eq!(
            repo.add(user.id, naruto.id, UserAnimeAction::Viewed).await.unwrap(),
            Added::Existing
        );
        repo.add(user.id, naruto.id, UserAnimeAction::Favorite).await.unwrap();
        repo.add(user.id, bleach.id, UserAnimeAction::Planned).await.unwrap();

        assert_eq!(repo.count_viewed_anime(user.id).await.unwrap(), 1);

        let filter = UserAnimeFilter {
            name: Some("ARU".into()),
            ..Default::default()
        };
        let page = repo.list(user.id, &filter, PageRequest::new(1, 12)).await.unwrap();
        assert_eq!(page.count, 2);
        assert!(page.items.iter().all(|(_, a)| a.id == naruto.id));

        assert_eq!(repo.remove(user.id, naruto.id, None).await.unwrap(), 2);
        assert_eq!(repo.count_viewed_anime(user.id).await.unwrap(), 0);
    }
}
