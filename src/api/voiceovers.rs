use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::{AuthUser, StaffUser};
use super::extract::ApiJson;
use super::pagination::{DEFAULT_PAGE_SIZE, Pagination};
use super::{ApiError, AppState};
use crate::api::types::{
    HistoryEventRequest, Paginated, StatusQuery, VoiceoverCreateRequest, VoiceoverDto,
    VoiceoverHistoryDto,
};
use crate::services::VoiceoverError;

impl From<VoiceoverError> for ApiError {
    fn from(err: VoiceoverError) -> Self {
        match err {
            VoiceoverError::NotFound => Self::not_found(),
            VoiceoverError::Forbidden(msg) => Self::Forbidden(msg),
            VoiceoverError::Validation(errors) => Self::Validation(errors),
            VoiceoverError::Database(msg) => Self::DatabaseError(msg),
            VoiceoverError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

/// POST /voiceover/
pub async fn create_voiceover(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<VoiceoverCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let voiceover = state.shared.voiceover_service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(voiceover)))
}

/// GET /voiceover/{id}/
pub async fn get_voiceover(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<VoiceoverDto>, ApiError> {
    Ok(Json(state.shared.voiceover_service.get(&user, id).await?))
}

/// GET /staff/voiceovers/?status=
pub async fn list_voiceovers(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    pagination: Pagination,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Paginated<VoiceoverDto>>, ApiError> {
    let request = pagination.request(DEFAULT_PAGE_SIZE)?;
    let page = state
        .shared
        .voiceover_service
        .list(query.status.as_deref(), request)
        .await?;
    Ok(Json(pagination.respond(page)?))
}

/// POST /staff/voiceovers/{id}/events/
pub async fn add_event(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<HistoryEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record: VoiceoverHistoryDto = state
        .shared
        .voiceover_service
        .add_event(&staff, id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
