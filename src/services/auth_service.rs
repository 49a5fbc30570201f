//! Domain service for registration and JWT authentication.
//!
//! Handles account creation, the login/refresh/logout token flow and
//! resolution of bearer tokens into users.

use thiserror::Error;

use crate::api::types::{
    AccessTokenDto, FieldError, LoginRequest, RefreshRequest, RegistrationDto,
    RegistrationRequest, TokenPairDto,
};
use crate::db::repositories::user::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    #[error("Token is invalid or expired")]
    InvalidToken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<super::tokens::TokenError> for AuthError {
    fn from(err: super::tokens::TokenError) -> Self {
        match err {
            super::tokens::TokenError::Invalid => Self::InvalidToken,
            super::tokens::TokenError::Signing(msg) => Self::Internal(msg),
        }
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and returns it with a fresh token pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] with field errors in request order,
    /// followed by the password confirmation check.
    async fn register(&self, request: RegistrationRequest) -> Result<RegistrationDto, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on a wrong username or password.
    async fn login(&self, request: LoginRequest) -> Result<TokenPairDto, AuthError>;

    /// Exchanges a refresh token for a new access token.
    async fn refresh(&self, request: RefreshRequest) -> Result<AccessTokenDto, AuthError>;

    /// Blacklists the refresh token.
    async fn logout(&self, request: RefreshRequest) -> Result<(), AuthError>;

    /// Resolves a bearer access token into an active user.
    async fn authenticate(&self, access_token: &str) -> Result<User, AuthError>;

    /// Drops blacklist entries whose tokens expired. Returns the number removed.
    async fn clear_expired_tokens(&self) -> Result<u64, AuthError>;
}
