use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::{MaybeUser, StaffUser};
use super::extract::{ApiJson, ClientIp};
use super::pagination::{DEFAULT_PAGE_SIZE, Pagination};
use super::{ApiError, AppState};
use crate::api::types::{
    AppealDto, AppealHistoryDto, BulkAssignDto, BulkAssignRequest, Empty, HelpAppealRequest,
    NoteRequest, Paginated, RightholderAppealRequest, StatusQuery,
};
use crate::domain::AppealKind;
use crate::services::SupportError;

impl From<SupportError> for ApiError {
    fn from(err: SupportError) -> Self {
        match err {
            SupportError::NotFound => Self::not_found(),
            SupportError::Validation(errors) => Self::Validation(errors),
            SupportError::Conflict(msg) => Self::Conflict(msg),
            SupportError::Database(msg) => Self::DatabaseError(msg),
            SupportError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

fn check_spam(state: &AppState, key: &str, ip: &str) -> Result<(), ApiError> {
    let spam = &state.shared.spam;
    if spam.check(key, ip) {
        Ok(())
    } else {
        tracing::info!(event = "spam_rejected", spam_key = key, client_ip = ip);
        Err(ApiError::Forbidden(spam.message()))
    }
}

fn appeal_kind(segment: &str) -> Result<AppealKind, ApiError> {
    AppealKind::from_path(segment).ok_or_else(ApiError::not_found)
}

/// POST /support/rightholder/
pub async fn create_rightholder(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ClientIp(ip): ClientIp,
    ApiJson(payload): ApiJson<RightholderAppealRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_spam(&state, "rightholder", &ip)?;
    state
        .shared
        .support_service
        .create_rightholder(user.as_ref(), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(Empty {})))
}

/// POST /support/help/
pub async fn create_help(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ClientIp(ip): ClientIp,
    ApiJson(payload): ApiJson<HelpAppealRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_spam(&state, "help", &ip)?;
    state
        .shared
        .support_service
        .create_help(user.as_ref(), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(Empty {})))
}

// ============================================================================
// Staff
// ============================================================================

/// GET /staff/appeals/{kind}/?status=
pub async fn list_appeals(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Path(kind): Path<String>,
    pagination: Pagination,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Paginated<AppealDto>>, ApiError> {
    let kind = appeal_kind(&kind)?;
    let request = pagination.request(DEFAULT_PAGE_SIZE)?;
    let page = state
        .shared
        .support_service
        .list(kind, query.status.as_deref(), request)
        .await?;
    Ok(Json(pagination.respond(page)?))
}

/// GET /staff/appeals/{kind}/{id}/
pub async fn get_appeal(
    State(state): State<Arc<AppState>>,
    StaffUser(_staff): StaffUser,
    Path((kind, id)): Path<(String, i32)>,
) -> Result<Json<AppealDto>, ApiError> {
    let kind = appeal_kind(&kind)?;
    Ok(Json(state.shared.support_service.detail(kind, id).await?))
}

/// POST /staff/appeals/{kind}/{id}/assign/
pub async fn assign(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path((kind, id)): Path<(String, i32)>,
) -> Result<Json<AppealDto>, ApiError> {
    let kind = appeal_kind(&kind)?;
    Ok(Json(
        state.shared.support_service.assign(kind, id, &staff).await?,
    ))
}

/// POST /staff/appeals/{kind}/{id}/unassign/
pub async fn unassign(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path((kind, id)): Path<(String, i32)>,
) -> Result<Json<AppealDto>, ApiError> {
    let kind = appeal_kind(&kind)?;
    Ok(Json(
        state
            .shared
            .support_service
            .unassign(kind, id, &staff)
            .await?,
    ))
}

/// POST /staff/appeals/{kind}/{id}/resolve/
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path((kind, id)): Path<(String, i32)>,
) -> Result<Json<AppealDto>, ApiError> {
    let kind = appeal_kind(&kind)?;
    Ok(Json(
        state.shared.support_service.resolve(kind, id, &staff).await?,
    ))
}

/// POST /staff/appeals/{kind}/{id}/notes/
pub async fn add_note(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path((kind, id)): Path<(String, i32)>,
    ApiJson(payload): ApiJson<NoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = appeal_kind(&kind)?;
    let note: AppealHistoryDto = state
        .shared
        .support_service
        .add_note(kind, id, &staff, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// POST /staff/appeals/{kind}/assign/
pub async fn bulk_assign(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path(kind): Path<String>,
    ApiJson(payload): ApiJson<BulkAssignRequest>,
) -> Result<Json<BulkAssignDto>, ApiError> {
    let kind = appeal_kind(&kind)?;
    Ok(Json(
        state
            .shared
            .support_service
            .bulk_assign(kind, &staff, payload)
            .await?,
    ))
}
