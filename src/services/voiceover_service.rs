//! Domain service for voiceover submissions and their review log.

use thiserror::Error;

use crate::api::types::{
    FieldError, HistoryEventRequest, VoiceoverCreateRequest, VoiceoverDto, VoiceoverHistoryDto,
};
use crate::db::repositories::user::User;
use crate::db::{Page, PageRequest};

#[derive(Debug, Error)]
pub enum VoiceoverError {
    #[error("Not found.")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for VoiceoverError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for VoiceoverError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait VoiceoverService: Send + Sync {
    /// Submits a link on behalf of a team the user belongs to.
    async fn create(&self, user: &User, request: VoiceoverCreateRequest) -> Result<VoiceoverDto, VoiceoverError>;

    /// Visible to the submitter and to staff.
    async fn get(&self, user: &User, id: i32) -> Result<VoiceoverDto, VoiceoverError>;

    async fn list(&self, status: Option<&str>, page: PageRequest) -> Result<Page<VoiceoverDto>, VoiceoverError>;

    /// Appends a review event and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceoverError::Forbidden`] when the submitter tries to
    /// approve their own voiceover.
    async fn add_event(
        &self,
        user: &User,
        id: i32,
        request: HistoryEventRequest,
    ) -> Result<VoiceoverHistoryDto, VoiceoverError>;
}
