//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::api::types::{
    AccessTokenDto, LoginRequest, RefreshRequest, RegistrationDto, RegistrationRequest,
    TokenPairDto, UserSummaryDto,
};
use crate::api::validation::{
    FieldErrors, INVALID_EMAIL, INVALID_USERNAME, is_valid_email, is_valid_username,
};
use crate::config::SecurityConfig;
use crate::db::Store;
use crate::db::repositories::user::{NewUser, User};
use crate::services::auth_service::{AuthError, AuthService};
use crate::services::tokens::{TokenIssuer, TokenType};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenIssuer>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenIssuer>, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            security,
        }
    }

    async fn validate_registration(
        &self,
        request: &RegistrationRequest,
    ) -> Result<NewUser, AuthError> {
        let users = self.store.users();
        let mut errors = FieldErrors::new();

        let username = errors.required("username", request.username.as_deref());
        if let Some(username) = username {
            if !is_valid_username(username) {
                errors.push("username", INVALID_USERNAME);
            } else if users.username_exists(username).await? {
                errors.push("username", "A user with that username already exists.");
            }
        }

        let email = errors.required("email", request.email.as_deref());
        if let Some(email) = email {
            if users.email_exists(email).await? {
                errors.push("email", "A user with that email already exists.");
            } else if !is_valid_email(email) {
                errors.push("email", INVALID_EMAIL);
            }
        }

        let password = errors.required("password", request.password.as_deref());
        let password_repeat =
            errors.required("password_repeat", request.password_repeat.as_deref());

        errors.into_result().map_err(AuthError::Validation)?;

        let (Some(username), Some(email), Some(password), Some(password_repeat)) =
            (username, email, password, password_repeat)
        else {
            return Err(AuthError::Internal("Validated fields missing".into()));
        };

        if password != password_repeat {
            let mut errors = FieldErrors::new();
            errors.push("password_repeat", "Password Does not match");
            return Err(AuthError::Validation(errors.into_inner()));
        }

        Ok(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            ..NewUser::default()
        })
    }

    async fn load_active_user(&self, user_id: i32) -> Result<User, AuthError> {
        self.store
            .users()
            .get_by_id(user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AuthError::InvalidToken)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, request: RegistrationRequest) -> Result<RegistrationDto, AuthError> {
        let new_user = self.validate_registration(&request).await?;
        let user = self.store.users().create(new_user, &self.security).await?;
        let pair = self.tokens.issue_pair(&user)?;

        info!(event = "user_registered", user_id = user.id, username = %user.username);

        Ok(RegistrationDto {
            user: UserSummaryDto {
                username: user.username,
                count_viewed_anime: 0,
                count_commented_anime: 0,
            },
            refresh: pair.refresh,
            access: pair.access,
        })
    }

    async fn login(&self, request: LoginRequest) -> Result<TokenPairDto, AuthError> {
        let mut errors = FieldErrors::new();
        let username = errors.required("username", request.username.as_deref());
        let password = errors.required("password", request.password.as_deref());
        errors.into_result().map_err(AuthError::Validation)?;

        let (Some(username), Some(password)) = (username, password) else {
            return Err(AuthError::Internal("Validated fields missing".into()));
        };

        let user = self
            .store
            .users()
            .verify_credentials(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.store.users().touch_last_login(user.id).await?;
        let pair = self.tokens.issue_pair(&user)?;

        Ok(TokenPairDto {
            refresh: pair.refresh,
            access: pair.access,
        })
    }

    async fn refresh(&self, request: RefreshRequest) -> Result<AccessTokenDto, AuthError> {
        let mut errors = FieldErrors::new();
        let token = errors.required("refresh", request.refresh.as_deref());
        errors.into_result().map_err(AuthError::Validation)?;
        let token = token.ok_or(AuthError::InvalidToken)?;

        let claims = self.tokens.verify(token, TokenType::Refresh)?;
        if self.store.tokens().is_blacklisted(&claims.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        let user = self.load_active_user(claims.user_id()?).await?;
        let access = self.tokens.issue(&user, TokenType::Access)?;

        Ok(AccessTokenDto { access })
    }

    async fn logout(&self, request: RefreshRequest) -> Result<(), AuthError> {
        let mut errors = FieldErrors::new();
        let token = errors.required("refresh", request.refresh.as_deref());
        errors.into_result().map_err(AuthError::Validation)?;
        let token = token.ok_or(AuthError::InvalidToken)?;

        let claims = self.tokens.verify(token, TokenType::Refresh)?;
        if self.store.tokens().is_blacklisted(&claims.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        self.store
            .tokens()
            .blacklist(&claims.jti, claims.user_id()?, claims.expires_at())
            .await?;

        Ok(())
    }

    async fn authenticate(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(access_token, TokenType::Access)?;
        self.load_active_user(claims.user_id()?).await
    }

    async fn clear_expired_tokens(&self) -> Result<u64, AuthError> {
        let removed = self.store.tokens().prune_expired(Utc::now()).await?;
        info!(event = "expired_tokens_cleared", removed);
        Ok(removed)
    }
}
