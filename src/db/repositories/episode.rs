use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::domain::{EpisodeStatus, VoiceoverStatus};
use crate::entities::{arches, episodes, teams, voiceovers};

#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub anime_id: i32,
    pub arch_id: Option<i32>,
    pub title: String,
    pub order: i32,
    pub status: EpisodeStatus,
    pub release_date: Option<NaiveDate>,
    pub is_accessible: bool,
    pub start_opening: Option<i32>,
    pub end_opening: Option<i32>,
    pub start_ending: Option<i32>,
    pub end_ending: Option<i32>,
}

pub struct EpisodeRepository {
    conn: DatabaseConnection,
}

impl EpisodeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<episodes::Model>> {
        episodes::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query episode")
    }

    pub async fn get_by_order(&self, anime_id: i32, order: i32) -> Result<Option<episodes::Model>> {
        episodes::Entity::find()
            .filter(episodes::Column::AnimeId.eq(anime_id))
            .filter(episodes::Column::Order.eq(order))
            .one(&self.conn)
            .await
            .context("Failed to query episode by order")
    }

    /// Episodes of an anime, newest order first.
    pub async fn list_for_anime(&self, anime_id: i32) -> Result<Vec<episodes::Model>> {
        episodes::Entity::find()
            .filter(episodes::Column::AnimeId.eq(anime_id))
            .order_by_desc(episodes::Column::Order)
            .all(&self.conn)
            .await
            .context("Failed to list episodes")
    }

    /// Episodes whose release date is today or later, soonest first.
    pub async fn release_schedule(&self, anime_id: i32, today: NaiveDate) -> Result<Vec<episodes::Model>> {
        episodes::Entity::find()
            .filter(episodes::Column::AnimeId.eq(anime_id))
            .filter(episodes::Column::ReleaseDate.gte(today))
            .order_by_asc(episodes::Column::ReleaseDate)
            .order_by_asc(episodes::Column::Order)
            .all(&self.conn)
            .await
            .context("Failed to query release schedule")
    }

    pub async fn order_taken(&self, anime_id: i32, order: i32) -> Result<bool> {
        let count = episodes::Entity::find()
            .filter(episodes::Column::AnimeId.eq(anime_id))
            .filter(episodes::Column::Order.eq(order))
            .count(&self.conn)
            .await
            .context("Failed to check episode order")?;
        Ok(count > 0)
    }

    pub async fn create(&self, input: NewEpisode) -> Result<episodes::Model> {
        let now = Utc::now();

        episodes::ActiveModel {
            anime_id: Set(input.anime_id),
            arch_id: Set(input.arch_id),
            title: Set(input.title),
            order: Set(input.order),
            status: Set(input.status),
            release_date: Set(input.release_date),
            is_accessible: Set(input.is_accessible),
            start_opening: Set(input.start_opening),
            end_opening: Set(input.end_opening),
            start_ending: Set(input.start_ending),
            end_ending: Set(input.end_ending),
            preview_image: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert episode")
    }

    pub async fn set_preview_image(&self, id: i32, key: &str) -> Result<()> {
        episodes::ActiveModel {
            id: Set(id),
            preview_image: Set(Some(key.to_string())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.conn)
        .await
        .context("Failed to update episode preview")?;
        Ok(())
    }

    /// Arches ordered by `order`, each with its episodes in ascending order.
    pub async fn arches_with_episodes(
        &self,
        anime_id: i32,
    ) -> Result<Vec<(arches::Model, Vec<episodes::Model>)>> {
        let rows = arches::Entity::find()
            .filter(arches::Column::AnimeId.eq(anime_id))
            .order_by_asc(arches::Column::Order)
            .find_with_related(episodes::Entity)
            .order_by_asc(episodes::Column::Order)
            .all(&self.conn)
            .await
            .context("Failed to query arches")?;

        Ok(rows)
    }

    pub async fn arch_order_taken(&self, anime_id: i32, order: i32) -> Result<bool> {
        let count = arches::Entity::find()
            .filter(arches::Column::AnimeId.eq(anime_id))
            .filter(arches::Column::Order.eq(order))
            .count(&self.conn)
            .await
            .context("Failed to check arch order")?;
        Ok(count > 0)
    }

    pub async fn get_arch(&self, id: i32) -> Result<Option<arches::Model>> {
        arches::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query arch")
    }

    pub async fn create_arch(&self, anime_id: i32, title: &str, order: i32) -> Result<arches::Model> {
        arches::ActiveModel {
            anime_id: Set(anime_id),
            title: Set(title.to_string()),
            order: Set(order),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert arch")
    }

    /// Approved voiceovers of an episode together with their team.
    pub async fn approved_voiceovers(
        &self,
        episode_id: i32,
    ) -> Result<Vec<(voiceovers::Model, teams::Model)>> {
        let rows = voiceovers::Entity::find()
            .filter(voiceovers::Column::EpisodeId.eq(episode_id))
            .filter(voiceovers::Column::Status.eq(VoiceoverStatus::Approved))
            .order_by_asc(voiceovers::Column::Id)
            .find_also_related(teams::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query voiceovers")?;

        Ok(rows
            .into_iter()
            .filter_map(|(voiceover, team)| team.map(|t| (voiceover, t)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::db::repositories::catalog::tests::sample_input;

    fn episode(anime_id: i32, order: i32, release_date: Option<NaiveDate>) -> NewEpisode {
        NewEpisode {
            anime_id,
            arch_id: None,
            title: format!("Episode {order}"),
            order,
            status: EpisodeStatus::Released,
            release_date,
            is_accessible: true,
            start_opening: None,
            end_opening: None,
            start_ending: None,
            end_ending: None,
        }
    }

    #[tokio::test]
    async fn listing_and_schedule() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let anime = store.catalog().create_anime(sample_input("Schedule")).await.unwrap();
        let repo = store.episodes();

        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        repo.create(episode(anime.id, 1, NaiveDate::from_ymd_opt(2024, 5, 3))).await.unwrap();
        repo.create(episode(anime.id, 2, Some(today))).await.unwrap();
        repo.create(episode(anime.id, 3, NaiveDate::from_ymd_opt(2024, 5, 17))).await.unwrap();

        let orders: Vec<i32> = repo
            .list_for_anime(anime.id)
            .await
            .unwrap()
            .iter()
            .map(|e| e.order)
            .collect();
        assert_eq!(orders, vec![3, 2, 1]);

        let upcoming: Vec<i32> = repo
            .release_schedule(anime.id, today)
            .await
            .unwrap()
            .iter()
            .map(|e| e.order)
            .collect();
        assert_eq!(upcoming, vec![2, 3]);

        assert!(repo.order_taken(anime.id, 2).await.unwrap());
        assert!(repo.create(episode(anime.id, 2, None)).await.is_err());
    }

    #[tokio::test]
    async fn arches_group_episodes() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let anime = store.catalog().create_anime(sample_input("Arcs")).await.unwrap();
        let repo = store.episodes();

        let second = repo.create_arch(anime.id, "Second", 2).await.unwrap();
        let first = repo.create_arch(anime.id, "First", 1).await.unwrap();

        let mut ep = episode(anime.id, 1, None);
        ep.arch_id = Some(first.id);
        repo.create(ep).await.unwrap();
        let mut ep = episode(anime.id, 2, None);
        ep.arch_id = Some(second.id);
        repo.create(ep).await.unwrap();

        let arches = repo.arches_with_episodes(anime.id).await.unwrap();
        let titles: Vec<&str> = arches.iter().map(|(a, _)| a.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(arches[0].1.len(), 1);
        assert!(repo.arch_order_taken(anime.id, 1).await.unwrap());
    }
}
