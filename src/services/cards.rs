//! Shared anime row representations used by several services.

use anyhow::Result;
use chrono::Datelike;

use crate::api::types::{AnimeCardDto, AnimeRefDto, GenreDto};
use crate::db::Store;
use crate::entities::{anime, genres};
use crate::services::media::MediaStorage;

impl From<genres::Model> for GenreDto {
    fn from(genre: genres::Model) -> Self {
        Self {
            id: genre.id,
            name: genre.name,
        }
    }
}

#[must_use]
pub fn anime_ref(media: &MediaStorage, anime: &anime::Model) -> AnimeRefDto {
    AnimeRefDto {
        id: anime.id,
        slug: anime.slug.clone(),
        title: anime.title.clone(),
        card_image: media.url_opt(anime.card_image.as_deref()),
    }
}

/// Builds list cards, loading genres and episode totals in two batch queries.
pub async fn anime_cards(
    store: &Store,
    media: &MediaStorage,
    models: Vec<anime::Model>,
) -> Result<Vec<AnimeCardDto>> {
    let ids: Vec<i32> = models.iter().map(|a| a.id).collect();
    let catalog = store.catalog();
    let mut genres = catalog.genres_by_anime(&ids).await?;
    let counts = catalog.episode_counts(&ids).await?;

    Ok(models
        .into_iter()
        .map(|anime| AnimeCardDto {
            id: anime.id,
            year: anime.start_date.year(),
            genres: genres
                .remove(&anime.id)
                .unwrap_or_default()
                .into_iter()
                .map(GenreDto::from)
                .collect(),
            count_episodes: counts.get(&anime.id).copied().unwrap_or_default(),
            card_image: media.url_opt(anime.card_image.as_deref()),
            slug: anime.slug,
            title: anime.title,
            anime_type: anime.anime_type,
            status: anime.status,
            rating: anime.rating,
            season: anime.season,
            is_top: anime.is_top,
        })
        .collect())
}
