//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;

use crate::api::types::{
    AvatarDto, EpisodeViewedDto, EpisodeViewedRequest, MeDto, UserAnimeDto, UserAnimeMarkDto,
    UserAnimeQuery, UserAnimeRequest,
};
use crate::api::validation::FieldErrors;
use crate::db::repositories::library::{Added, UserAnimeFilter};
use crate::db::repositories::user::User;
use crate::db::{Page, PageRequest, Store};
use crate::domain::{AnimeType, UserAnimeAction};
use crate::services::cards::anime_cards;
use crate::services::media::{MediaPath, MediaStorage, is_image};
use crate::services::staff_service::Upload;
use crate::services::user_service::{UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    media: MediaStorage,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, media: MediaStorage) -> Self {
        Self { store, media }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn me(&self, user: &User) -> Result<MeDto, UserError> {
        let count_viewed_anime = self.store.library().count_viewed_anime(user.id).await?;
        let count_commented_anime = self.store.comments().commented_anime_count(user.id).await?;

        Ok(MeDto {
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: self.media.url_opt(user.avatar.as_deref()),
            count_viewed_anime,
            count_commented_anime,
        })
    }

    async fn set_avatar(&self, user: &User, upload: Upload) -> Result<AvatarDto, UserError> {
        let mut errors = FieldErrors::new();
        if upload.bytes.is_empty() {
            errors.push("avatar", "No file was submitted.");
        } else if !is_image(&upload.filename) {
            errors.push("avatar", "Upload a valid image.");
        }
        errors.into_result().map_err(UserError::Validation)?;

        let key = MediaPath::Avatar(&user.username).key(&upload.filename);
        self.media.save(&key, &upload.bytes).await?;
        self.store.users().set_avatar(user.id, &key).await?;

        Ok(AvatarDto {
            avatar: self.media.url(&key),
        })
    }

    async fn list_anime(
        &self,
        user: &User,
        query: &UserAnimeQuery,
        page: PageRequest,
    ) -> Result<Page<UserAnimeDto>, UserError> {
        let mut errors = FieldErrors::new();
        let filter = UserAnimeFilter {
            action: errors.choice::<UserAnimeAction>("action", query.action.as_deref()),
            genre_id: errors.integer("genres", query.genres.as_deref()),
            anime_type: errors.choice::<AnimeType>("type", query.anime_type.as_deref()),
            name: query.name.clone(),
        };
        errors.into_result().map_err(UserError::Validation)?;

        let Page {
            items,
            count,
            page,
            page_size,
        } = self.store.library().list(user.id, &filter, page).await?;

        let (marks, anime): (Vec<_>, Vec<_>) = items.into_iter().unzip();
        let cards = anime_cards(&self.store, &self.media, anime).await?;
        let items = marks
            .into_iter()
            .zip(cards)
            .map(|(mark, anime)| UserAnimeDto {
                id: mark.id,
                action: mark.action,
                anime,
                created: mark.created_at,
            })
            .collect();

        Ok(Page {
            items,
            count,
            page,
            page_size,
        })
    }

    async fn add_anime(
        &self,
        user: &User,
        request: UserAnimeRequest,
    ) -> Result<(Added, UserAnimeMarkDto), UserError> {
        let mut errors = FieldErrors::new();
        let action = errors.required_choice::<UserAnimeAction>("action", request.action.as_deref());
        let anime_id = errors.required_value("anime", request.anime);
        if let Some(id) = anime_id
            && self.store.catalog().get_anime(id).await?.is_none()
        {
            errors.push("anime", "Anime not found.");
        }
        errors.into_result().map_err(UserError::Validation)?;

        let (Some(action), Some(anime)) = (action, anime_id) else {
            return Err(UserError::Internal("Validated mark fields missing".into()));
        };

        let added = self.store.library().add(user.id, anime, action).await?;
        Ok((added, UserAnimeMarkDto { action, anime }))
    }

    async fn remove_anime(&self, user: &User, request: UserAnimeRequest) -> Result<u64, UserError> {
        let mut errors = FieldErrors::new();
        let anime_id = errors.required_value("anime", request.anime);
        let action = errors.choice::<UserAnimeAction>("action", request.action.as_deref());
        errors.into_result().map_err(UserError::Validation)?;
        let Some(anime_id) = anime_id else {
            return Ok(0);
        };

        Ok(self.store.library().remove(user.id, anime_id, action).await?)
    }

    async fn episode_viewed(
        &self,
        user: &User,
        request: EpisodeViewedRequest,
    ) -> Result<(Added, EpisodeViewedDto), UserError> {
        let mut errors = FieldErrors::new();
        let episode_id = errors.required_value("episode", request.episode);
        if let Some(id) = episode_id
            && self.store.episodes().get(id).await?.is_none()
        {
            errors.push("episode", "Episode not found.");
        }
        errors.into_result().map_err(UserError::Validation)?;
        let Some(episode) = episode_id else {
            return Err(UserError::Internal("Validated episode missing".into()));
        };

        let added = self.store.library().mark_episode_viewed(user.id, episode).await?;
        Ok((added, EpisodeViewedDto { episode }))
    }
}
