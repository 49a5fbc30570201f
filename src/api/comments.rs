use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::{AuthUser, StaffUser};
use super::extract::ApiJson;
use super::pagination::Pagination;
use super::{ApiError, AppState};
use crate::api::types::{
    CommentCreateRequest, CommentDto, CommentUpdateRequest, Empty, Paginated, PinRequest,
    ReactionDto, ReactionRequest,
};
use crate::services::CommentError;

impl From<CommentError> for ApiError {
    fn from(err: CommentError) -> Self {
        match err {
            CommentError::NotFound => Self::not_found(),
            CommentError::Forbidden => Self::permission_denied(),
            CommentError::Validation(errors) => Self::Validation(errors),
            CommentError::Database(msg) => Self::DatabaseError(msg),
            CommentError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

/// POST /comment/
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<CommentCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state.shared.comment_service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /comment/{urlhash}/replies/
pub async fn list_replies(
    State(state): State<Arc<AppState>>,
    Path(urlhash): Path<String>,
    pagination: Pagination,
) -> Result<Json<Paginated<CommentDto>>, ApiError> {
    let request = pagination.request(state.shared.config.catalog.comment_page_size)?;
    let page = state
        .shared
        .comment_service
        .replies(&urlhash, request)
        .await?;
    Ok(Json(pagination.respond(page)?))
}

/// PATCH /comment/{urlhash}/
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(urlhash): Path<String>,
    ApiJson(payload): ApiJson<CommentUpdateRequest>,
) -> Result<Json<CommentDto>, ApiError> {
    Ok(Json(
        state
            .shared
            .comment_service
            .update(&user, &urlhash, payload)
            .await?,
    ))
}

/// DELETE /comment/{urlhash}/
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(urlhash): Path<String>,
) -> Result<Json<Empty>, ApiError> {
    state.shared.comment_service.delete(&user, &urlhash).await?;
    Ok(Json(Empty {}))
}

/// POST /comment/{pk}/reaction/
pub async fn react(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<ReactionRequest>,
) -> Result<Json<ReactionDto>, ApiError> {
    Ok(Json(
        state
            .shared
            .comment_service
            .react(user.id, id, payload)
            .await?,
    ))
}

/// POST /staff/comments/{urlhash}/pin/
pub async fn pin_comment(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Path(urlhash): Path<String>,
    ApiJson(payload): ApiJson<PinRequest>,
) -> Result<Json<CommentDto>, ApiError> {
    Ok(Json(
        state
            .shared
            .comment_service
            .pin(&urlhash, payload.is_pinned)
            .await?,
    ))
}
