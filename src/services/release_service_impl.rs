use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::clients::myanimelist::MyAnimeListClient;
use crate::db::Store;
use crate::db::repositories::release::{IssuedToken, NewToken};
use crate::domain::ReleaseSource;
use crate::services::release_service::{
    AuthOutcome, DEFAULT_KEYWORD, ReleaseError, ReleaseService, UpdateOptions,
};

const SEARCH_LIMIT: u32 = 20;

pub struct MyAnimeListReleaseService {
    store: Store,
    client: MyAnimeListClient,
}

impl MyAnimeListReleaseService {
    #[must_use]
    pub const fn new(store: Store, client: MyAnimeListClient) -> Self {
        Self { store, client }
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ReleaseError> {
        let releases = self.store.releases();
        let token = releases.newest_token().await?.ok_or(ReleaseError::TokenMissing)?;

        let response = self
            .client
            .generate_new_token(code, &token.code_verifier)
            .await?;
        let access_token = response.access_token.clone();

        releases
            .store_issued(
                token,
                IssuedToken {
                    access_token: response.access_token,
                    refresh_token: response.refresh_token,
                    expires_in: response.expires_in,
                    token_type: response.token_type,
                },
            )
            .await?;

        Ok(access_token)
    }
}

#[async_trait]
impl ReleaseService for MyAnimeListReleaseService {
    async fn authorise(&self) -> Result<AuthOutcome, ReleaseError> {
        let releases = self.store.releases();
        if let Some(token) = releases.active_token(Utc::now()).await? {
            let id = self
                .update_releases(UpdateOptions {
                    access_token: token.access_token,
                    ..Default::default()
                })
                .await?;
            return Ok(AuthOutcome::Updated(id));
        }

        let code_verifier = MyAnimeListClient::new_code_verifier();
        let authorisation_url = self.client.authorisation_url(&code_verifier, "");
        releases
            .create_token(NewToken {
                code_challenge: code_verifier.clone(),
                code_verifier,
                authorisation_url: authorisation_url.clone(),
            })
            .await?;

        info!(
            event = "myanimelist_authorisation_required",
            url = %authorisation_url,
            "Open the authorisation url to grant access"
        );
        Ok(AuthOutcome::AuthorisationRequired { authorisation_url })
    }

    async fn update_releases(&self, options: UpdateOptions) -> Result<i32, ReleaseError> {
        let access_token = match (options.authorisation_code.as_deref(), options.access_token) {
            (Some(code), _) => self.exchange_code(code).await?,
            (None, Some(token)) => token,
            (None, None) => self
                .store
                .releases()
                .active_token(Utc::now())
                .await?
                .and_then(|t| t.access_token)
                .ok_or(ReleaseError::TokenMissing)?,
        };

        let keyword = options.keyword.as_deref().unwrap_or(DEFAULT_KEYWORD);
        let content = self
            .client
            .connect(&access_token)
            .search_anime(keyword, SEARCH_LIMIT)
            .await?;

        let update = self
            .store
            .releases()
            .record_update(ReleaseSource::MyAnimeList, options.user_id, content)
            .await?;

        info!(
            event = "myanimelist_releases_updated",
            update_release_id = update.id,
            keyword,
            "Stored MyAnimeList search results"
        );
        Ok(update.id)
    }
}
