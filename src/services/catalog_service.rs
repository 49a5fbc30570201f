//! Domain service for the public anime catalog.

use thiserror::Error;

use crate::api::types::{
    AnimeCardDto, AnimeDetailDto, AnimeListQuery, ArchDto, DirectorDetailDto, EpisodeDetailDto,
    FieldError, FiltersDto, PosterDto, RandomAnimeDto, ReactionDto, ReactionRequest,
    StudioDetailDto,
};
use crate::db::{Page, PageRequest};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Not found.")]
    NotFound,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Which rows `list` returns and in what order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimeListing {
    Newest,
    Random,
    Top,
}

#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Full anime card with episodes, schedule, reactions and neighbours.
    async fn anime_detail(&self, id: i32) -> Result<AnimeDetailDto, CatalogError>;

    /// Episode by its order; only approved voiceovers are listed.
    async fn episode_detail(&self, anime_id: i32, order: i32) -> Result<EpisodeDetailDto, CatalogError>;

    async fn arches(&self, anime_id: i32) -> Result<Vec<ArchDto>, CatalogError>;

    /// Toggles the user's reaction on the anime.
    async fn react(
        &self,
        user_id: i32,
        anime_id: i32,
        request: ReactionRequest,
    ) -> Result<ReactionDto, CatalogError>;

    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for malformed filter values.
    async fn list(
        &self,
        query: &AnimeListQuery,
        listing: AnimeListing,
        page: PageRequest,
    ) -> Result<Page<AnimeCardDto>, CatalogError>;

    async fn search(&self, term: Option<&str>, page: PageRequest) -> Result<Page<AnimeCardDto>, CatalogError>;

    async fn random(&self) -> Result<RandomAnimeDto, CatalogError>;

    async fn posters(&self) -> Result<Vec<PosterDto>, CatalogError>;

    async fn filters(&self) -> Result<FiltersDto, CatalogError>;

    async fn director(&self, id: i32) -> Result<DirectorDetailDto, CatalogError>;

    async fn studio(&self, id: i32) -> Result<StudioDetailDto, CatalogError>;
}
