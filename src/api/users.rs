use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::AuthUser;
use super::extract::{ApiJson, UploadQuery};
use super::pagination::Pagination;
use super::{ApiError, AppState};
use crate::api::types::{
    AvatarDto, DeletedDto, EpisodeViewedRequest, MeDto, Paginated, UserAnimeDto, UserAnimeQuery,
    UserAnimeRequest,
};
use crate::db::repositories::library::Added;
use crate::services::UserError;

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(errors) => Self::Validation(errors),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

const fn created_or_ok(added: Added) -> StatusCode {
    match added {
        Added::Created => StatusCode::CREATED,
        Added::Existing => StatusCode::OK,
    }
}

/// GET /user/me/
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<MeDto>, ApiError> {
    Ok(Json(state.shared.user_service.me(&user).await?))
}

/// PUT /user/me/avatar/?filename=
pub async fn set_avatar(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<AvatarDto>, ApiError> {
    let upload = query.into_upload(body)?;
    Ok(Json(state.shared.user_service.set_avatar(&user, upload).await?))
}

/// GET /user/anime/
pub async fn list_anime(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    pagination: Pagination,
    Query(query): Query<UserAnimeQuery>,
) -> Result<Json<Paginated<UserAnimeDto>>, ApiError> {
    let request = pagination.request(state.shared.config.catalog.user_anime_page_size)?;
    let page = state
        .shared
        .user_service
        .list_anime(&user, &query, request)
        .await?;
    Ok(Json(pagination.respond(page)?))
}

/// POST /user/anime/
pub async fn add_anime(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<UserAnimeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (added, mark) = state.shared.user_service.add_anime(&user, payload).await?;
    Ok((created_or_ok(added), Json(mark)))
}

/// DELETE /user/anime/
pub async fn remove_anime(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<UserAnimeRequest>,
) -> Result<Json<DeletedDto>, ApiError> {
    let deleted = state
        .shared
        .user_service
        .remove_anime(&user, payload)
        .await?;
    Ok(Json(DeletedDto { deleted }))
}

/// POST /user/episode/viewed/
pub async fn episode_viewed(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<EpisodeViewedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (added, viewed) = state
        .shared
        .user_service
        .episode_viewed(&user, payload)
        .await?;
    Ok((created_or_ok(added), Json(viewed)))
}
