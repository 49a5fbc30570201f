//! Catalog management for staff users.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::StaffUser;
use super::extract::{ApiJson, UploadQuery};
use super::{ApiError, AppState};
use crate::api::types::{
    AnimeCardDto, AnimeHistoryDto, AnimeWriteRequest, ArchWriteRequest, DirectorWriteRequest,
    Empty, EpisodeWriteRequest, ImageDto, NameRequest, StudioWriteRequest, TeamMemberRequest,
    TopStateDto,
};
use crate::services::{AnimeImageSlot, StaffError};

impl From<StaffError> for ApiError {
    fn from(err: StaffError) -> Self {
        match err {
            StaffError::NotFound => Self::not_found(),
            StaffError::Validation(errors) => Self::Validation(errors),
            StaffError::TooManyTopAnime(_) => Self::Conflict(err.to_string()),
            StaffError::Database(msg) => Self::DatabaseError(msg),
            StaffError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

fn image_slot(segment: &str) -> Result<AnimeImageSlot, ApiError> {
    match segment {
        "card" => Ok(AnimeImageSlot::Card),
        "background" => Ok(AnimeImageSlot::Background),
        "preview" => Ok(AnimeImageSlot::Preview),
        _ => Err(ApiError::not_found()),
    }
}

// ============================================================================
// Anime
// ============================================================================

/// POST /staff/anime/
pub async fn create_anime(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    ApiJson(payload): ApiJson<AnimeWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let anime = state.shared.staff_service.create_anime(payload).await?;
    Ok((StatusCode::CREATED, Json(anime)))
}

/// PUT /staff/anime/{id}/
pub async fn update_anime(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<AnimeWriteRequest>,
) -> Result<Json<AnimeCardDto>, ApiError> {
    Ok(Json(
        state.shared.staff_service.update_anime(id, payload).await?,
    ))
}

/// DELETE /staff/anime/{id}/
pub async fn delete_anime(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path(id): Path<i32>,
) -> Result<Json<Empty>, ApiError> {
    state.shared.staff_service.delete_anime(id).await?;
    tracing::info!(event = "anime_deleted", anime_id = id, user_id = staff.id);
    Ok(Json(Empty {}))
}

/// POST /staff/anime/{id}/top/
pub async fn set_top(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path(id): Path<i32>,
) -> Result<Json<TopStateDto>, ApiError> {
    Ok(Json(state.shared.staff_service.set_top(id, staff.id).await?))
}

/// DELETE /staff/anime/{id}/top/
pub async fn reset_top(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path(id): Path<i32>,
) -> Result<Json<TopStateDto>, ApiError> {
    Ok(Json(
        state.shared.staff_service.reset_top(id, staff.id).await?,
    ))
}

/// GET /staff/anime/{id}/history/
pub async fn anime_history(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AnimeHistoryDto>>, ApiError> {
    Ok(Json(state.shared.staff_service.anime_history(id).await?))
}

/// PUT /staff/anime/{id}/images/{slot}/?filename=
pub async fn upload_anime_image(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Path((id, slot)): Path<(i32, String)>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<ImageDto>, ApiError> {
    let slot = image_slot(&slot)?;
    let upload = query.into_upload(body)?;
    Ok(Json(
        state
            .shared
            .staff_service
            .upload_anime_image(id, slot, upload)
            .await?,
    ))
}

/// PUT /staff/anime/{id}/poster/?filename=&description=
///
/// An empty body keeps the current image and only updates the description.
pub async fn upload_poster(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<i32>,
    Query(mut query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<ImageDto>, ApiError> {
    let description = query.description.take();
    let upload = if body.is_empty() {
        None
    } else {
        Some(query.into_upload(body)?)
    };

    Ok(Json(
        state
            .shared
            .staff_service
            .upload_poster(id, upload, description)
            .await?,
    ))
}

// ============================================================================
// Episodes and arches
// ============================================================================

/// POST /staff/anime/{id}/episodes/
pub async fn create_episode(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<EpisodeWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let episode = state.shared.staff_service.create_episode(id, payload).await?;
    Ok((StatusCode::CREATED, Json(episode)))
}

/// PUT /staff/episodes/{id}/preview/?filename=
pub async fn upload_episode_preview(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<i32>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<ImageDto>, ApiError> {
    let upload = query.into_upload(body)?;
    Ok(Json(
        state
            .shared
            .staff_service
            .upload_episode_preview(id, upload)
            .await?,
    ))
}

/// POST /staff/anime/{id}/arches/
pub async fn create_arch(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<ArchWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let arch = state.shared.staff_service.create_arch(id, payload).await?;
    Ok((StatusCode::CREATED, Json(arch)))
}

// ============================================================================
// Dictionaries
// ============================================================================

/// POST /staff/genres/
pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    ApiJson(payload): ApiJson<NameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let genre = state.shared.staff_service.create_genre(payload).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// POST /staff/studios/
pub async fn create_studio(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    ApiJson(payload): ApiJson<StudioWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let studio = state.shared.staff_service.create_studio(payload).await?;
    Ok((StatusCode::CREATED, Json(studio)))
}

/// POST /staff/directors/
pub async fn create_director(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    ApiJson(payload): ApiJson<DirectorWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let director = state.shared.staff_service.create_director(payload).await?;
    Ok((StatusCode::CREATED, Json(director)))
}

/// POST /staff/teams/
pub async fn create_team(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    ApiJson(payload): ApiJson<NameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let team = state.shared.staff_service.create_team(payload).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// POST /staff/teams/{id}/members/
pub async fn add_team_member(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<TeamMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.shared.staff_service.add_team_member(id, payload).await?;
    Ok((StatusCode::CREATED, Json(Empty {})))
}
