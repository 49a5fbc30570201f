//! Domain service for the signed-in user's profile and anime lists.

use thiserror::Error;

use crate::api::types::{
    AvatarDto, EpisodeViewedDto, EpisodeViewedRequest, FieldError, MeDto, UserAnimeDto,
    UserAnimeMarkDto, UserAnimeQuery, UserAnimeRequest,
};
use crate::db::repositories::library::Added;
use crate::db::repositories::user::User;
use crate::db::{Page, PageRequest};
use crate::services::staff_service::Upload;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Profile with viewed and commented anime totals.
    async fn me(&self, user: &User) -> Result<MeDto, UserError>;

    async fn set_avatar(&self, user: &User, upload: Upload) -> Result<AvatarDto, UserError>;

    async fn list_anime(
        &self,
        user: &User,
        query: &UserAnimeQuery,
        page: PageRequest,
    ) -> Result<Page<UserAnimeDto>, UserError>;

    /// Marks an anime; [`Added::Existing`] when the mark was already there.
    async fn add_anime(
        &self,
        user: &User,
        request: UserAnimeRequest,
    ) -> Result<(Added, UserAnimeMarkDto), UserError>;

    /// Removes marks of one anime. Returns the number of rows deleted.
    async fn remove_anime(&self, user: &User, request: UserAnimeRequest) -> Result<u64, UserError>;

    async fn episode_viewed(
        &self,
        user: &User,
        request: EpisodeViewedRequest,
    ) -> Result<(Added, EpisodeViewedDto), UserError>;
}
