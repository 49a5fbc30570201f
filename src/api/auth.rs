use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::extract::ApiJson;
use super::{ApiError, AppState};
use crate::api::types::{
    AccessTokenDto, Empty, LoginRequest, RefreshRequest, RegistrationDto, RegistrationRequest,
    TokenPairDto,
};
use crate::db::repositories::user::User;
use crate::services::AuthError;

const BEARER_NOT_VALID: &str = "Given token not valid for any token type";

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => Self::Validation(errors),
            AuthError::InvalidCredentials => Self::Unauthorized {
                detail: err.to_string(),
                code: None,
            },
            AuthError::InvalidToken => Self::token_not_valid(err.to_string()),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

/// The user resolved from a valid bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <access>` into a [`CurrentUser`].
///
/// Requests without the header pass through anonymously; a header that does
/// not carry a valid access token is rejected outright.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    if let Some(token) = token {
        let user = match state.shared.auth_service.authenticate(&token).await {
            Ok(user) => user,
            Err(AuthError::InvalidToken) => {
                return Err(ApiError::token_not_valid(BEARER_NOT_VALID));
            }
            Err(err) => return Err(err.into()),
        };

        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(CurrentUser(user));
    }

    Ok(next.run(request).await)
}

// ============================================================================
// Extractors
// ============================================================================

/// Any signed-in user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|CurrentUser(user)| Self(user.clone()))
            .ok_or_else(ApiError::not_authenticated)
    }
}

/// A signed-in user with `is_staff`.
#[derive(Debug, Clone)]
pub struct StaffUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for StaffUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.is_staff {
            Ok(Self(user))
        } else {
            Err(ApiError::permission_denied())
        }
    }
}

/// The signed-in user, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<CurrentUser>()
                .map(|CurrentUser(user)| user.clone()),
        ))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/registration/
pub async fn registration(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegistrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created: RegistrationDto = state.shared.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /auth/login/
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<TokenPairDto>, ApiError> {
    let pair = state.shared.auth_service.login(payload).await?;
    Ok(Json(pair))
}

/// POST /auth/token/refresh/
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<AccessTokenDto>, ApiError> {
    let access = state.shared.auth_service.refresh(payload).await?;
    Ok(Json(access))
}

/// POST /auth/logout/
pub async fn logout(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<Empty>, ApiError> {
    state.shared.auth_service.logout(payload).await?;
    Ok(Json(Empty {}))
}
