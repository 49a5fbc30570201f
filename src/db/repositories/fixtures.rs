//! Throwaway catalog data for local environments.

use anyhow::{Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::domain::{AnimeStatus, AnimeType, Choice, EpisodeStatus, Rating, Season, make_slug};
use crate::entities::{anime, anime_genres, anime_studios, arches, directors, episodes, genres, posters, studios};

const WORDS: &[&str] = &[
    "crimson", "moon", "blade", "spirit", "academy", "silent", "garden", "storm", "hunter",
    "echo", "frontier", "paper", "dragon", "station", "winter", "promise", "shadow", "river",
    "clockwork", "festival", "lantern", "ocean", "rebel", "star",
];
const NAMES: &[&str] = &["Tom", "Test", "Best"];
const COUNTRIES: &[&str] = &["JP", "KR", "CN", "US", "FR", "UA"];

/// How many rows of each kind to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureCounts {
    pub genres: u32,
    pub directors: u32,
    pub studios: u32,
    pub anime: u32,
    pub arches: u32,
    pub episodes: u32,
    pub posters: u32,
}

impl Default for FixtureCounts {
    fn default() -> Self {
        Self {
            genres: 10,
            directors: 10,
            studios: 10,
            anime: 10,
            arches: 10,
            episodes: 10,
            posters: 10,
        }
    }
}

/// Rows actually created; name clashes and missing parents are skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixtureReport {
    pub genres: u32,
    pub directors: u32,
    pub studios: u32,
    pub anime: u32,
    pub arches: u32,
    pub episodes: u32,
    pub posters: u32,
}

pub struct FixtureRepository {
    conn: DatabaseConnection,
}

impl FixtureRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Fills the catalog in a single transaction.
    pub async fn generate(&self, counts: FixtureCounts) -> Result<FixtureReport> {
        let mut rng = StdRng::from_rng(&mut rand::rng());
        let mut report = FixtureReport::default();
        let now = Utc::now();
        let txn = self.conn.begin().await?;

        for _ in 0..counts.genres {
            let name = sentence(&mut rng);
            if exists(&txn, genres::Entity::find().filter(genres::Column::Name.eq(&name))).await? {
                continue;
            }
            genres::ActiveModel {
                name: Set(name),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to insert genre")?;
            report.genres += 1;
        }

        for _ in 0..counts.directors {
            directors::ActiveModel {
                first_name: Set(pick(&mut rng, NAMES).to_string()),
                last_name: Set(pick(&mut rng, NAMES).to_string()),
                url: Set(Some("http://localhost:8000".to_string())),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to insert director")?;
            report.directors += 1;
        }

        for _ in 0..counts.studios {
            let name = sentence(&mut rng);
            if exists(&txn, studios::Entity::find().filter(studios::Column::Name.eq(&name))).await? {
                continue;
            }
            studios::ActiveModel {
                name: Set(name),
                description: Set("test".to_string()),
                country: Set(Some(pick(&mut rng, COUNTRIES).to_string())),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to insert studio")?;
            report.studios += 1;
        }

        let genre_ids = ids(&txn, genres::Entity::find().select_only().column(genres::Column::Id)).await?;
        let director_ids =
            ids(&txn, directors::Entity::find().select_only().column(directors::Column::Id)).await?;
        let studio_ids = ids(&txn, studios::Entity::find().select_only().column(studios::Column::Id)).await?;

        for _ in 0..counts.anime {
            let title = sentence(&mut rng);
            let model = anime::ActiveModel {
                slug: Set(make_slug(&title)),
                title: Set(title),
                anime_type: Set(AnimeType::Anime),
                status: Set(*pick(&mut rng, AnimeStatus::ALL)),
                rating: Set(*pick(&mut rng, Rating::ALL)),
                season: Set(*pick(&mut rng, Season::ALL)),
                description: Set(sentence(&mut rng)),
                start_date: Set(now.date_naive()),
                director_id: Set(director_ids.choose(&mut rng).copied()),
                is_top: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to insert anime")?;

            if let Some(&genre_id) = genre_ids.choose(&mut rng) {
                anime_genres::ActiveModel {
                    anime_id: Set(model.id),
                    genre_id: Set(genre_id),
                }
                .insert(&txn)
                .await?;
            }
            if let Some(&studio_id) = studio_ids.choose(&mut rng) {
                anime_studios::ActiveModel {
                    anime_id: Set(model.id),
                    studio_id: Set(studio_id),
                }
                .insert(&txn)
                .await?;
            }
            report.anime += 1;
        }

        let anime_ids = ids(&txn, anime::Entity::find().select_only().column(anime::Column::Id)).await?;
        if anime_ids.is_empty() {
            txn.commit().await?;
            return Ok(report);
        }

        for _ in 0..counts.arches {
            let anime_id = *pick(&mut rng, &anime_ids);
            let last = arches::Entity::find()
                .filter(arches::Column::AnimeId.eq(anime_id))
                .order_by_desc(arches::Column::Order)
                .one(&txn)
                .await?;
            arches::ActiveModel {
                anime_id: Set(anime_id),
                title: Set(sentence(&mut rng)),
                order: Set(last.map_or(1, |a| a.order + 1)),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to insert arch")?;
            report.arches += 1;
        }

        for _ in 0..counts.episodes {
            let anime_id = *pick(&mut rng, &anime_ids);
            let last = episodes::Entity::find()
                .filter(episodes::Column::AnimeId.eq(anime_id))
                .order_by_desc(episodes::Column::Order)
                .one(&txn)
                .await?;
            let arch_ids = ids(
                &txn,
                arches::Entity::find()
                    .select_only()
                    .column(arches::Column::Id)
                    .filter(arches::Column::AnimeId.eq(anime_id)),
            )
            .await?;
            let arch_id = if rng.random_bool(0.5) {
                arch_ids.choose(&mut rng).copied()
            } else {
                None
            };

            episodes::ActiveModel {
                anime_id: Set(anime_id),
                arch_id: Set(arch_id),
                title: Set(sentence(&mut rng)),
                order: Set(last.map_or(1, |e| e.order + 1)),
                status: Set(EpisodeStatus::Released),
                release_date: Set(Some(now.date_naive())),
                is_accessible: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to insert episode")?;
            report.episodes += 1;
        }

        for _ in 0..counts.posters {
            let anime_id = *pick(&mut rng, &anime_ids);
            if exists(&txn, posters::Entity::find().filter(posters::Column::AnimeId.eq(anime_id))).await? {
                continue;
            }
            posters::ActiveModel {
                anime_id: Set(anime_id),
                image: Set(None),
                description: Set(sentence(&mut rng)),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to insert poster")?;
            report.posters += 1;
        }

        txn.commit().await?;
        Ok(report)
    }
}

async fn exists<E, C>(conn: &C, select: sea_orm::Select<E>) -> Result<bool>
where
    E: EntityTrait,
    E::Model: Send + Sync,
    C: ConnectionTrait,
{
    Ok(select.count(conn).await? > 0)
}

async fn ids<E, C>(conn: &C, select: sea_orm::Select<E>) -> Result<Vec<i32>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    select.into_tuple().all(conn).await.context("Failed to collect ids")
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    let index = rng.random_range(0..items.len());
    &items[index]
}

fn sentence(rng: &mut StdRng) -> String {
    let len = rng.random_range(2..=4);
    let mut words: Vec<&str> = (0..len).map(|_| *pick(rng, WORDS)).collect();
    let suffix = format!("{}", rng.random_range(1..10_000));
    words.push(&suffix);

    let mut text = words.join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    #[tokio::test]
    async fn generates_linked_catalog() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let report = store.fixtures().generate(FixtureCounts::default()).await.unwrap();

        assert_eq!(report.directors, 10);
        assert_eq!(report.anime, 10);
        assert_eq!(report.episodes, 10);
        assert!(report.posters >= 1);

        let anime_total = anime::Entity::find().count(&store.conn).await.unwrap();
        assert_eq!(anime_total, 10);
    }

    #[tokio::test]
    async fn empty_catalog_skips_children() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let counts = FixtureCounts {
            anime: 0,
            ..FixtureCounts::default()
        };
        let report = store.fixtures().generate(counts).await.unwrap();
        assert_eq!((report.anime, report.episodes, report.posters), (0, 0, 0));
    }
}
