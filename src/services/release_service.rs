//! Domain service for importing releases from MyAnimeList.

use thiserror::Error;

use crate::clients::myanimelist::MyAnimeListError;

pub const DEFAULT_KEYWORD: &str = "naruto";

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("An authorisation token must be obtained first")]
    TokenMissing,

    #[error("MyAnimeList error: {0}")]
    External(#[from] MyAnimeListError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ReleaseError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ReleaseError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result of an authorisation round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// An active token existed and the import ran; carries the stored
    /// update release id.
    Updated(i32),
    /// A new PKCE round was started; the url must be opened by an operator.
    AuthorisationRequired { authorisation_url: String },
}

/// Options of one import run.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub authorisation_code: Option<String>,
    pub access_token: Option<String>,
    pub keyword: Option<String>,
    pub user_id: Option<i32>,
}

#[async_trait::async_trait]
pub trait ReleaseService: Send + Sync {
    async fn authorise(&self) -> Result<AuthOutcome, ReleaseError>;

    /// Exchanges the authorisation code when given, searches the catalog and
    /// stores the raw response. Returns the update release id.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::TokenMissing`] when a code is given but no
    /// authorisation round was started, or when no access token is known.
    async fn update_releases(&self, options: UpdateOptions) -> Result<i32, ReleaseError>;
}
