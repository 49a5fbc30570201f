use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::Value;
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::api::types::{CallbackQuery, Empty};
use crate::cli::commands::{CommandContext, CommandError};
use crate::services::ReleaseError;
use crate::tasks::CommandPayload;

impl From<ReleaseError> for ApiError {
    fn from(err: ReleaseError) -> Self {
        match err {
            ReleaseError::TokenMissing => Self::Conflict(err.to_string()),
            ReleaseError::External(inner) => Self::ExternalApiError {
                service: "MyAnimeList".to_string(),
                message: inner.to_string(),
            },
            ReleaseError::Database(msg) => Self::DatabaseError(msg),
            ReleaseError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Release(inner) => inner.into(),
            CommandError::Auth(inner) => inner.into(),
            other => Self::InternalError(other.to_string()),
        }
    }
}

/// GET /update_release/callback/myanimelist/?code=
///
/// Redirect target of the MyAnimeList authorisation page.
pub async fn myanimelist_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Empty>, ApiError> {
    let Some(code) = query.code else {
        return Ok(Json(Empty {}));
    };

    let mut payload = CommandPayload::new("myanimelist_update_releases");
    payload
        .kwargs
        .insert("authorisation_code".to_string(), Value::String(code));

    CommandContext::new(state.shared.clone()).run(&payload).await?;
    Ok(Json(Empty {}))
}
