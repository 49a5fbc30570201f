//! `SeaORM` implementation of the `CatalogService` trait.

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::collections::BTreeMap;

use crate::api::types::{
    AnimeCardDto, AnimeDetailDto, AnimeListQuery, ArchDto, DirectorDetailDto, DirectorRefDto,
    EpisodeDetailDto, EpisodeRefDto, FiltersDto, GenreDto, PosterAnimeDto, PosterDto,
    RandomAnimeDto, ReactionDto, ReactionRequest, ScheduleItemDto, StudioDetailDto, StudioDto,
    TeamDto, TitleDto, VoiceoverLinkDto,
};
use crate::api::validation::FieldErrors;
use crate::db::repositories::catalog::{AnimeFilter, AnimeOrdering};
use crate::db::{Page, PageRequest, Store};
use crate::domain::{AnimeStatus, AnimeType, Choice, ReactionKind, Season, VoiceoverType};
use crate::entities::{anime, directors, episodes, studios, teams};
use crate::services::cards::{anime_cards, anime_ref};
use crate::services::catalog_service::{AnimeListing, CatalogError, CatalogService};
use crate::services::media::MediaStorage;

const SIMILAR_LIMIT: u64 = 6;

pub struct SeaOrmCatalogService {
    store: Store,
    media: MediaStorage,
}

impl SeaOrmCatalogService {
    #[must_use]
    pub const fn new(store: Store, media: MediaStorage) -> Self {
        Self { store, media }
    }

    async fn anime(&self, id: i32) -> Result<anime::Model, CatalogError> {
        self.store
            .catalog()
            .get_anime(id)
            .await?
            .ok_or(CatalogError::NotFound)
    }

    async fn cards(&self, page: Page<anime::Model>) -> Result<Page<AnimeCardDto>, CatalogError> {
        let Page {
            items,
            count,
            page,
            page_size,
        } = page;
        let items = anime_cards(&self.store, &self.media, items).await?;
        Ok(Page {
            items,
            count,
            page,
            page_size,
        })
    }
}

#[must_use]
pub fn full_name(director: &directors::Model) -> String {
    format!("{} {}", director.first_name, director.last_name)
        .trim()
        .to_string()
}

impl From<&directors::Model> for DirectorRefDto {
    fn from(director: &directors::Model) -> Self {
        Self {
            id: director.id,
            full_name: full_name(director),
        }
    }
}

impl From<studios::Model> for StudioDto {
    fn from(studio: studios::Model) -> Self {
        Self {
            id: studio.id,
            name: studio.name,
            country: studio.country,
        }
    }
}

impl From<teams::Model> for TeamDto {
    fn from(team: teams::Model) -> Self {
        Self {
            id: team.id,
            name: team.name,
        }
    }
}

impl From<&episodes::Model> for EpisodeRefDto {
    fn from(episode: &episodes::Model) -> Self {
        Self {
            id: episode.id,
            title: episode.title.clone(),
            order: episode.order,
        }
    }
}

fn labels<C: Choice>() -> BTreeMap<&'static str, &'static str> {
    C::labels().into_iter().collect()
}

fn parse_filter(query: &AnimeListQuery) -> Result<AnimeFilter, CatalogError> {
    let mut errors = FieldErrors::new();

    let filter = AnimeFilter {
        genre_id: errors.integer("genres", query.genres.as_deref()),
        studio_id: errors.integer("studio", query.studio.as_deref()),
        country: query
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase),
        status: errors.choice::<AnimeStatus>("status", query.status.as_deref()),
        director_id: errors.integer("director", query.director.as_deref()),
        anime_type: errors.choice::<AnimeType>("type", query.anime_type.as_deref()),
        team_id: errors.integer("voiceover", query.voiceover.as_deref()),
        season: errors.choice::<Season>("season", query.season.as_deref()),
        year_gte: errors.integer("year_gte", query.year_gte.as_deref()),
        year_lte: errors.integer("year_lte", query.year_lte.as_deref()),
        search: None,
        only_top: false,
    };

    errors.into_result().map_err(CatalogError::Validation)?;
    Ok(filter)
}

#[async_trait]
impl CatalogService for SeaOrmCatalogService {
    async fn anime_detail(&self, id: i32) -> Result<AnimeDetailDto, CatalogError> {
        let anime = self.anime(id).await?;
        let catalog = self.store.catalog();
        let episodes_repo = self.store.episodes();

        let genres = catalog
            .genres_by_anime(&[anime.id])
            .await?
            .remove(&anime.id)
            .unwrap_or_default();
        let director = catalog.director_of(&anime).await?;
        let studios = catalog.studios_of(&anime).await?;
        let episodes = episodes_repo.list_for_anime(anime.id).await?;
        let schedule = episodes_repo
            .release_schedule(anime.id, Utc::now().date_naive())
            .await?;
        let teams = catalog.approved_teams_of(anime.id).await?;
        let reactions = catalog.reaction_counts(anime.id).await?;
        let similar = catalog.similar_to(anime.id, SIMILAR_LIMIT).await?;
        let related = catalog.related_of(anime.id).await?;
        let previews = catalog.preview_images_of(anime.id).await?;

        Ok(AnimeDetailDto {
            id: anime.id,
            year: anime.start_date.year(),
            type_display: anime.anime_type.label(),
            status_display: anime.status.label(),
            season_display: anime.season.label(),
            rating_display: anime.rating.label(),
            card_image: self.media.url_opt(anime.card_image.as_deref()),
            background_image: self.media.url_opt(anime.background_image.as_deref()),
            preview_images: previews
                .iter()
                .filter_map(|p| self.media.url_opt(p.image.as_deref()))
                .collect(),
            genres: genres.into_iter().map(GenreDto::from).collect(),
            director: director.as_ref().map(DirectorRefDto::from),
            studios: studios.into_iter().map(StudioDto::from).collect(),
            count_episodes: episodes.len() as u64,
            episodes: episodes.iter().map(EpisodeRefDto::from).collect(),
            release_schedule: schedule
                .into_iter()
                .map(|e| ScheduleItemDto {
                    title: e.title,
                    order: e.order,
                    release_date: e.release_date,
                })
                .collect(),
            voiceovers: teams.into_iter().map(TeamDto::from).collect(),
            reactions,
            similar: similar.iter().map(|a| anime_ref(&self.media, a)).collect(),
            related: related.iter().map(|a| anime_ref(&self.media, a)).collect(),
            slug: anime.slug,
            title: anime.title,
            other_title: anime.other_title,
            description: anime.description,
            anime_type: anime.anime_type,
            status: anime.status,
            season: anime.season,
            rating: anime.rating,
            release_day_of_week: anime.release_day_of_week,
            average_time_episode: anime.average_time_episode,
            start_date: anime.start_date,
            end_date: anime.end_date,
            country: anime.country,
            trailer_url: anime.trailer_url,
            is_top: anime.is_top,
        })
    }

    async fn episode_detail(&self, anime_id: i32, order: i32) -> Result<EpisodeDetailDto, CatalogError> {
        let episodes = self.store.episodes();
        let episode = episodes
            .get_by_order(anime_id, order)
            .await?
            .ok_or(CatalogError::NotFound)?;

        let (mut voiceover, mut subtitles) = (Vec::new(), Vec::new());
        for (row, team) in episodes.approved_voiceovers(episode.id).await? {
            let link = VoiceoverLinkDto {
                id: row.id,
                url: row.url,
                team: TeamDto::from(team),
            };
            match row.voiceover_type {
                VoiceoverType::Voiceover => voiceover.push(link),
                VoiceoverType::Subtitles => subtitles.push(link),
            }
        }

        Ok(EpisodeDetailDto {
            id: episode.id,
            title: episode.title,
            order: episode.order,
            release_date: episode.release_date,
            preview_image: self.media.url_opt(episode.preview_image.as_deref()),
            start_opening: episode.start_opening,
            end_opening: episode.end_opening,
            start_ending: episode.start_ending,
            end_ending: episode.end_ending,
            voiceover,
            subtitles,
        })
    }

    async fn arches(&self, anime_id: i32) -> Result<Vec<ArchDto>, CatalogError> {
        let anime = self.anime(anime_id).await?;
        let arches = self.store.episodes().arches_with_episodes(anime.id).await?;

        Ok(arches
            .into_iter()
            .map(|(arch, episodes)| ArchDto {
                id: arch.id,
                title: arch.title,
                order: arch.order,
                episodes: episodes.iter().map(EpisodeRefDto::from).collect(),
            })
            .collect())
    }

    async fn react(
        &self,
        user_id: i32,
        anime_id: i32,
        request: ReactionRequest,
    ) -> Result<ReactionDto, CatalogError> {
        let mut errors = FieldErrors::new();
        let kind = errors.required_choice::<ReactionKind>("reaction", request.reaction.as_deref());
        errors.into_result().map_err(CatalogError::Validation)?;
        let kind = kind.ok_or_else(|| CatalogError::Internal("Validated kind missing".into()))?;

        let anime = self.anime(anime_id).await?;
        let action = self
            .store
            .catalog()
            .toggle_reaction(user_id, anime.id, kind)
            .await?;

        Ok(ReactionDto { action })
    }

    async fn list(
        &self,
        query: &AnimeListQuery,
        listing: AnimeListing,
        page: PageRequest,
    ) -> Result<Page<AnimeCardDto>, CatalogError> {
        let (filter, ordering) = match listing {
            AnimeListing::Newest => (parse_filter(query)?, AnimeOrdering::Newest),
            AnimeListing::Random => (AnimeFilter::default(), AnimeOrdering::Random),
            AnimeListing::Top => (
                AnimeFilter {
                    only_top: true,
                    ..AnimeFilter::default()
                },
                AnimeOrdering::Newest,
            ),
        };

        let rows = self.store.catalog().list_anime(&filter, ordering, page).await?;
        self.cards(rows).await
    }

    async fn search(&self, term: Option<&str>, page: PageRequest) -> Result<Page<AnimeCardDto>, CatalogError> {
        let filter = AnimeFilter {
            search: term.map(ToString::to_string),
            ..AnimeFilter::default()
        };
        let rows = self
            .store
            .catalog()
            .list_anime(&filter, AnimeOrdering::Newest, page)
            .await?;
        self.cards(rows).await
    }

    async fn random(&self) -> Result<RandomAnimeDto, CatalogError> {
        let anime = self
            .store
            .catalog()
            .random_anime()
            .await?
            .ok_or(CatalogError::NotFound)?;

        Ok(RandomAnimeDto {
            id: anime.id,
            slug: anime.slug,
        })
    }

    async fn posters(&self) -> Result<Vec<PosterDto>, CatalogError> {
        let catalog = self.store.catalog();
        let posters = catalog.posters().await?;
        let ids: Vec<i32> = posters.iter().map(|(_, a)| a.id).collect();
        let counts = catalog.episode_counts(&ids).await?;

        Ok(posters
            .into_iter()
            .map(|(poster, anime)| PosterDto {
                anime: PosterAnimeDto {
                    id: anime.id,
                    count_episodes: counts.get(&anime.id).copied().unwrap_or_default(),
                    slug: anime.slug,
                    title: anime.title,
                },
                image: self.media.url_opt(poster.image.as_deref()),
                description: poster.description,
            })
            .collect())
    }

    async fn filters(&self) -> Result<FiltersDto, CatalogError> {
        let options = self.store.catalog().filter_options().await?;

        Ok(FiltersDto {
            directors: options.directors.iter().map(DirectorRefDto::from).collect(),
            genres: options.genres.into_iter().map(GenreDto::from).collect(),
            studios: options
                .studios
                .into_iter()
                .map(|s| GenreDto {
                    id: s.id,
                    name: s.name,
                })
                .collect(),
            countries: options
                .countries
                .into_iter()
                .map(|code| (code.clone(), code))
                .collect(),
            voiceover: options.teams.into_iter().map(TeamDto::from).collect(),
            status: labels::<AnimeStatus>(),
            anime_type: labels::<AnimeType>(),
            season: labels::<Season>(),
        })
    }

    async fn director(&self, id: i32) -> Result<DirectorDetailDto, CatalogError> {
        let (director, anime) = self
            .store
            .catalog()
            .get_director(id)
            .await?
            .ok_or(CatalogError::NotFound)?;

        Ok(DirectorDetailDto {
            id: director.id,
            full_name: full_name(&director),
            first_name: director.first_name,
            last_name: director.last_name,
            url: director.url,
            anime: anime.into_iter().map(|a| TitleDto { title: a.title }).collect(),
        })
    }

    async fn studio(&self, id: i32) -> Result<StudioDetailDto, CatalogError> {
        let (studio, anime) = self
            .store
            .catalog()
            .get_studio(id)
            .await?
            .ok_or(CatalogError::NotFound)?;

        Ok(StudioDetailDto {
            id: studio.id,
            name: studio.name,
            description: studio.description,
            country: studio.country,
            anime: anime.into_iter().map(|a| TitleDto { title: a.title }).collect(),
        })
    }
}
