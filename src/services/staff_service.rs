//! Domain service for staff-only catalog management.
//!
//! Covers anime CRUD, the TOP section, image uploads and the lookup tables
//! (genres, studios, directors, voiceover teams).

use thiserror::Error;

use crate::api::types::{
    AnimeCardDto, AnimeHistoryDto, AnimeWriteRequest, ArchDto, ArchWriteRequest, DirectorDto,
    DirectorWriteRequest, EpisodeDto, EpisodeWriteRequest, FieldError, GenreDto, ImageDto,
    NameRequest, StudioDto, StudioWriteRequest, TeamDto, TeamMemberRequest, TopStateDto,
};

#[derive(Debug, Error)]
pub enum StaffError {
    #[error("Not found.")]
    NotFound,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("The TOP-{0} section already has enough anime; review the list and replace one")]
    TooManyTopAnime(u64),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for StaffError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for StaffError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Image slots of an anime that accept uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimeImageSlot {
    Card,
    Background,
    Preview,
}

/// A raw upload: the client-side file name and its bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[async_trait::async_trait]
pub trait StaffService: Send + Sync {
    async fn create_anime(&self, request: AnimeWriteRequest) -> Result<AnimeCardDto, StaffError>;

    /// Replaces all writable fields; the slug follows the new title.
    async fn update_anime(&self, id: i32, request: AnimeWriteRequest) -> Result<AnimeCardDto, StaffError>;

    async fn delete_anime(&self, id: i32) -> Result<(), StaffError>;

    /// # Errors
    ///
    /// Returns [`StaffError::TooManyTopAnime`] when the section is full.
    async fn set_top(&self, id: i32, user_id: i32) -> Result<TopStateDto, StaffError>;

    async fn reset_top(&self, id: i32, user_id: i32) -> Result<TopStateDto, StaffError>;

    async fn anime_history(&self, id: i32) -> Result<Vec<AnimeHistoryDto>, StaffError>;

    async fn upload_anime_image(
        &self,
        id: i32,
        slot: AnimeImageSlot,
        upload: Upload,
    ) -> Result<ImageDto, StaffError>;

    /// Creates or replaces the anime's poster.
    async fn upload_poster(
        &self,
        anime_id: i32,
        upload: Option<Upload>,
        description: Option<String>,
    ) -> Result<ImageDto, StaffError>;

    async fn create_episode(&self, anime_id: i32, request: EpisodeWriteRequest) -> Result<EpisodeDto, StaffError>;

    async fn upload_episode_preview(&self, episode_id: i32, upload: Upload) -> Result<ImageDto, StaffError>;

    async fn create_arch(&self, anime_id: i32, request: ArchWriteRequest) -> Result<ArchDto, StaffError>;

    async fn create_genre(&self, request: NameRequest) -> Result<GenreDto, StaffError>;

    async fn create_studio(&self, request: StudioWriteRequest) -> Result<StudioDto, StaffError>;

    async fn create_director(&self, request: DirectorWriteRequest) -> Result<DirectorDto, StaffError>;

    async fn create_team(&self, request: NameRequest) -> Result<TeamDto, StaffError>;

    async fn add_team_member(&self, team_id: i32, request: TeamMemberRequest) -> Result<(), StaffError>;
}
