//! Domain service for threaded comments on anime and episodes.

use thiserror::Error;

use crate::api::types::{
    CommentCreateRequest, CommentDto, CommentUpdateRequest, FieldError, ReactionDto,
    ReactionRequest,
};
use crate::db::repositories::user::User;
use crate::db::{Page, PageRequest};

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Not found.")]
    NotFound,

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CommentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CommentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait CommentService: Send + Sync {
    async fn create(&self, user: &User, request: CommentCreateRequest) -> Result<CommentDto, CommentError>;

    /// Top-level comments of an anime, pinned first then newest.
    async fn list_for_anime(&self, anime_id: i32, page: PageRequest) -> Result<Page<CommentDto>, CommentError>;

    async fn replies(&self, urlhash: &str, page: PageRequest) -> Result<Page<CommentDto>, CommentError>;

    /// Replaces the current text. Only the author may edit.
    async fn update(
        &self,
        user: &User,
        urlhash: &str,
        request: CommentUpdateRequest,
    ) -> Result<CommentDto, CommentError>;

    /// Deletes the comment with all of its replies. Author or staff.
    async fn delete(&self, user: &User, urlhash: &str) -> Result<(), CommentError>;

    async fn react(&self, user_id: i32, comment_id: i32, request: ReactionRequest) -> Result<ReactionDto, CommentError>;

    async fn pin(&self, urlhash: &str, is_pinned: bool) -> Result<CommentDto, CommentError>;
}
