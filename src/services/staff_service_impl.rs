//! `SeaORM` implementation of the `StaffService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::api::types::{
    AnimeCardDto, AnimeHistoryDto, AnimeWriteRequest, ArchDto, ArchWriteRequest, DirectorDto,
    DirectorWriteRequest, EpisodeDto, EpisodeWriteRequest, GenreDto, ImageDto, NameRequest,
    StudioDto, StudioWriteRequest, TeamDto, TeamMemberRequest, TopStateDto,
};
use crate::api::validation::FieldErrors;
use crate::config::CatalogConfig;
use crate::db::Store;
use crate::db::repositories::catalog::{AnimeImage, AnimeInput, LinkKind, TopOutcome};
use crate::db::repositories::episode::NewEpisode;
use crate::domain::{
    AnimeStatus, AnimeType, Choice, DayOfWeek, EpisodeStatus, Rating, Season,
};
use crate::entities::anime;
use crate::services::cards::anime_cards;
use crate::services::catalog_service_impl::full_name;
use crate::services::media::{MediaPath, MediaStorage, is_image};
use crate::services::staff_service::{AnimeImageSlot, StaffError, StaffService, Upload};

pub struct SeaOrmStaffService {
    store: Store,
    media: MediaStorage,
    catalog: CatalogConfig,
}

fn invalid_pk(id: i32) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

fn check_upload(upload: &Upload) -> Result<(), StaffError> {
    let mut errors = FieldErrors::new();
    if upload.bytes.is_empty() {
        errors.push("image", "No file was submitted.");
    } else if !is_image(&upload.filename) {
        errors.push("image", "Upload a valid image.");
    }
    errors.into_result().map_err(StaffError::Validation)
}

impl SeaOrmStaffService {
    #[must_use]
    pub const fn new(store: Store, media: MediaStorage, catalog: CatalogConfig) -> Self {
        Self {
            store,
            media,
            catalog,
        }
    }

    async fn anime(&self, id: i32) -> Result<anime::Model, StaffError> {
        self.store
            .catalog()
            .get_anime(id)
            .await?
            .ok_or(StaffError::NotFound)
    }

    async fn card(&self, model: anime::Model) -> Result<AnimeCardDto, StaffError> {
        anime_cards(&self.store, &self.media, vec![model])
            .await?
            .pop()
            .ok_or(StaffError::NotFound)
    }

    async fn check_links(
        &self,
        errors: &mut FieldErrors,
        field: &str,
        kind: LinkKind,
        ids: &[i32],
    ) -> Result<(), StaffError> {
        let found = self.store.catalog().existing_ids(kind, ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
            errors.push(field, invalid_pk(*missing));
        }
        Ok(())
    }

    async fn validate_anime(&self, request: AnimeWriteRequest) -> Result<AnimeInput, StaffError> {
        let mut errors = FieldErrors::new();

        let title = errors.required("title", request.title.as_deref()).map(str::to_string);
        let anime_type = errors.required_choice::<AnimeType>("type", request.anime_type.as_deref());
        let status = errors.choice::<AnimeStatus>("status", request.status.as_deref());
        let rating = errors.required_choice::<Rating>("rating", request.rating.as_deref());
        let season = errors.choice::<Season>("season", request.season.as_deref());
        let start_date = errors.required_value("start_date", request.start_date);
        let release_day_of_week =
            errors.choice::<DayOfWeek>("release_day_of_week", request.release_day_of_week.as_deref());

        if let Some(director) = request.director {
            self.check_links(&mut errors, "director", LinkKind::Director, &[director])
                .await?;
        }
        self.check_links(&mut errors, "genres", LinkKind::Genre, &request.genres)
            .await?;
        self.check_links(&mut errors, "studios", LinkKind::Studio, &request.studios)
            .await?;
        self.check_links(&mut errors, "related", LinkKind::Anime, &request.related)
            .await?;

        errors.into_result().map_err(StaffError::Validation)?;

        let (Some(title), Some(anime_type), Some(rating), Some(start_date)) =
            (title, anime_type, rating, start_date)
        else {
            return Err(StaffError::Internal("Validated anime fields missing".into()));
        };

        Ok(AnimeInput {
            title,
            anime_type,
            status: status.unwrap_or_default(),
            rating,
            season: season.unwrap_or_default(),
            description: request.description.unwrap_or_default(),
            other_title: request.other_title,
            start_date,
            end_date: request.end_date,
            release_day_of_week,
            average_time_episode: request.average_time_episode,
            country: request.country,
            trailer_url: request.trailer_url,
            director_id: request.director,
            genre_ids: request.genres,
            studio_ids: request.studios,
            related_ids: request.related,
        })
    }
}

#[async_trait]
impl StaffService for SeaOrmStaffService {
    async fn create_anime(&self, request: AnimeWriteRequest) -> Result<AnimeCardDto, StaffError> {
        let input = self.validate_anime(request).await?;
        let model = self.store.catalog().create_anime(input).await?;
        info!(event = "anime_created", anime_id = model.id, slug = %model.slug);
        self.card(model).await
    }

    async fn update_anime(&self, id: i32, request: AnimeWriteRequest) -> Result<AnimeCardDto, StaffError> {
        self.anime(id).await?;
        let input = self.validate_anime(request).await?;
        let model = self
            .store
            .catalog()
            .update_anime(id, input)
            .await?
            .ok_or(StaffError::NotFound)?;
        self.card(model).await
    }

    async fn delete_anime(&self, id: i32) -> Result<(), StaffError> {
        if !self.store.catalog().delete_anime(id).await? {
            return Err(StaffError::NotFound);
        }
        info!(event = "anime_deleted", anime_id = id);
        Ok(())
    }

    async fn set_top(&self, id: i32, user_id: i32) -> Result<TopStateDto, StaffError> {
        let limit = self.catalog.count_top_anime;
        let outcome = self
            .store
            .catalog()
            .set_top(id, Some(user_id), limit)
            .await?
            .ok_or(StaffError::NotFound)?;

        if outcome == TopOutcome::LimitReached {
            return Err(StaffError::TooManyTopAnime(limit));
        }
        Ok(TopStateDto { id, is_top: true })
    }

    async fn reset_top(&self, id: i32, user_id: i32) -> Result<TopStateDto, StaffError> {
        self.store
            .catalog()
            .reset_top(id, Some(user_id))
            .await?
            .ok_or(StaffError::NotFound)?;
        Ok(TopStateDto { id, is_top: false })
    }

    async fn anime_history(&self, id: i32) -> Result<Vec<AnimeHistoryDto>, StaffError> {
        self.anime(id).await?;
        let history = self.store.catalog().history_of(id).await?;

        Ok(history
            .into_iter()
            .map(|h| AnimeHistoryDto {
                event: h.event.code(),
                message: h.message,
                user_id: h.user_id,
                created: h.created_at,
            })
            .collect())
    }

    async fn upload_anime_image(
        &self,
        id: i32,
        slot: AnimeImageSlot,
        upload: Upload,
    ) -> Result<ImageDto, StaffError> {
        let anime = self.anime(id).await?;
        check_upload(&upload)?;

        let path = match slot {
            AnimeImageSlot::Card => MediaPath::AnimeCard(anime.id),
            AnimeImageSlot::Background => MediaPath::AnimeBackground(anime.id),
            AnimeImageSlot::Preview => MediaPath::AnimePreview(anime.id),
        };
        let key = path.key(&upload.filename);
        self.media.save(&key, &upload.bytes).await?;

        let catalog = self.store.catalog();
        match slot {
            AnimeImageSlot::Card => catalog.set_image(anime.id, AnimeImage::Card, &key).await?,
            AnimeImageSlot::Background => {
                catalog.set_image(anime.id, AnimeImage::Background, &key).await?;
            }
            AnimeImageSlot::Preview => {
                catalog.add_preview_image(anime.id, &key).await?;
            }
        }

        Ok(ImageDto {
            image: self.media.url(&key),
        })
    }

    async fn upload_poster(
        &self,
        anime_id: i32,
        upload: Option<Upload>,
        description: Option<String>,
    ) -> Result<ImageDto, StaffError> {
        let anime = self.anime(anime_id).await?;

        let key = match upload {
            Some(upload) => {
                check_upload(&upload)?;
                let key = MediaPath::Poster(anime.id).key(&upload.filename);
                self.media.save(&key, &upload.bytes).await?;
                Some(key)
            }
            None => None,
        };

        let poster = self
            .store
            .catalog()
            .upsert_poster(anime.id, key.as_deref(), description.as_deref().unwrap_or_default())
            .await?;

        Ok(ImageDto {
            image: self
                .media
                .url_opt(poster.image.as_deref())
                .unwrap_or_default(),
        })
    }

    async fn create_episode(&self, anime_id: i32, request: EpisodeWriteRequest) -> Result<EpisodeDto, StaffError> {
        let anime = self.anime(anime_id).await?;
        let episodes = self.store.episodes();
        let mut errors = FieldErrors::new();

        let title = errors.required("title", request.title.as_deref()).map(str::to_string);
        let order = errors.required_value("order", request.order);
        if let Some(order) = order
            && episodes.order_taken(anime.id, order).await?
        {
            errors.push("order", "An episode with this order already exists for the anime.");
        }
        let status = errors.choice::<EpisodeStatus>("status", request.status.as_deref());
        if let Some(arch_id) = request.arch {
            let arch = episodes.get_arch(arch_id).await?;
            if arch.is_none_or(|a| a.anime_id != anime.id) {
                errors.push("arch", invalid_pk(arch_id));
            }
        }

        errors.into_result().map_err(StaffError::Validation)?;
        let (Some(title), Some(order)) = (title, order) else {
            return Err(StaffError::Internal("Validated episode fields missing".into()));
        };

        let episode = episodes
            .create(NewEpisode {
                anime_id: anime.id,
                arch_id: request.arch,
                title,
                order,
                status: status.unwrap_or(EpisodeStatus::Announced),
                release_date: request.release_date,
                is_accessible: request.is_accessible,
                start_opening: request.start_opening,
                end_opening: request.end_opening,
                start_ending: request.start_ending,
                end_ending: request.end_ending,
            })
            .await?;

        Ok(EpisodeDto {
            id: episode.id,
            anime: episode.anime_id,
            arch: episode.arch_id,
            title: episode.title,
            order: episode.order,
            status: episode.status,
            release_date: episode.release_date,
            is_accessible: episode.is_accessible,
            preview_image: None,
        })
    }

    async fn upload_episode_preview(&self, episode_id: i32, upload: Upload) -> Result<ImageDto, StaffError> {
        let episodes = self.store.episodes();
        let episode = episodes.get(episode_id).await?.ok_or(StaffError::NotFound)?;
        check_upload(&upload)?;

        let key = MediaPath::EpisodePreview(episode.id).key(&upload.filename);
        self.media.save(&key, &upload.bytes).await?;
        episodes.set_preview_image(episode.id, &key).await?;

        Ok(ImageDto {
            image: self.media.url(&key),
        })
    }

    async fn create_arch(&self, anime_id: i32, request: ArchWriteRequest) -> Result<ArchDto, StaffError> {
        let anime = self.anime(anime_id).await?;
        let episodes = self.store.episodes();
        let mut errors = FieldErrors::new();

        let title = errors.required("title", request.title.as_deref());
        let order = errors.required_value("order", request.order);
        if let Some(order) = order
            && episodes.arch_order_taken(anime.id, order).await?
        {
            errors.push("order", "An arch with this order already exists for the anime.");
        }
        errors.into_result().map_err(StaffError::Validation)?;
        let (Some(title), Some(order)) = (title, order) else {
            return Err(StaffError::Internal("Validated arch fields missing".into()));
        };

        let arch = episodes.create_arch(anime.id, title, order).await?;
        Ok(ArchDto {
            id: arch.id,
            title: arch.title,
            order: arch.order,
            episodes: Vec::new(),
        })
    }

    async fn create_genre(&self, request: NameRequest) -> Result<GenreDto, StaffError> {
        let catalog = self.store.catalog();
        let mut errors = FieldErrors::new();
        let name = errors.required("name", request.name.as_deref());
        if let Some(name) = name
            && catalog.genre_exists(name).await?
        {
            errors.push("name", "A genre with that name already exists.");
        }
        errors.into_result().map_err(StaffError::Validation)?;
        let name = name.ok_or_else(|| StaffError::Internal("Validated name missing".into()))?;

        Ok(GenreDto::from(catalog.create_genre(name).await?))
    }

    async fn create_studio(&self, request: StudioWriteRequest) -> Result<StudioDto, StaffError> {
        let catalog = self.store.catalog();
        let mut errors = FieldErrors::new();
        let name = errors.required("name", request.name.as_deref());
        if let Some(name) = name
            && catalog.studio_exists(name).await?
        {
            errors.push("name", "A studio with that name already exists.");
        }
        errors.into_result().map_err(StaffError::Validation)?;
        let name = name.ok_or_else(|| StaffError::Internal("Validated name missing".into()))?;

        let studio = catalog
            .create_studio(
                name,
                &request.description,
                request.country.as_deref().map(str::trim).filter(|c| !c.is_empty()),
            )
            .await?;
        Ok(StudioDto::from(studio))
    }

    async fn create_director(&self, request: DirectorWriteRequest) -> Result<DirectorDto, StaffError> {
        let mut errors = FieldErrors::new();
        let first_name = errors.required("first_name", request.first_name.as_deref());
        errors.into_result().map_err(StaffError::Validation)?;
        let first_name = first_name.ok_or_else(|| StaffError::Internal("Validated first_name missing".into()))?;

        let director = self
            .store
            .catalog()
            .create_director(first_name, request.last_name.trim(), request.url.as_deref())
            .await?;

        Ok(DirectorDto {
            id: director.id,
            full_name: full_name(&director),
            first_name: director.first_name,
            last_name: director.last_name,
            url: director.url,
        })
    }

    async fn create_team(&self, request: NameRequest) -> Result<TeamDto, StaffError> {
        let catalog = self.store.catalog();
        let mut errors = FieldErrors::new();
        let name = errors.required("name", request.name.as_deref());
        if let Some(name) = name
            && catalog.team_exists(name).await?
        {
            errors.push("name", "A team with that name already exists.");
        }
        errors.into_result().map_err(StaffError::Validation)?;
        let name = name.ok_or_else(|| StaffError::Internal("Validated name missing".into()))?;

        Ok(TeamDto::from(catalog.create_team(name).await?))
    }

    async fn add_team_member(&self, team_id: i32, request: TeamMemberRequest) -> Result<(), StaffError> {
        let catalog = self.store.catalog();
        let team = catalog.get_team(team_id).await?.ok_or(StaffError::NotFound)?;

        let mut errors = FieldErrors::new();
        let user_id = errors.required_value("user", request.user);
        if let Some(user_id) = user_id
            && self.store.users().get_by_id(user_id).await?.is_none()
        {
            errors.push("user", invalid_pk(user_id));
        }
        errors.into_result().map_err(StaffError::Validation)?;
        let user_id = user_id.ok_or_else(|| StaffError::Internal("Validated user_id missing".into()))?;

        catalog.add_team_member(team.id, user_id).await?;
        info!(event = "team_member_added", team_id = team.id, user_id);
        Ok(())
    }
}
