use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::ReleaseSource;
use crate::entities::{myanimelist_tokens, update_releases};

/// PKCE material for a new authorisation round.
#[derive(Debug, Clone)]
pub struct NewToken {
    pub code_verifier: String,
    pub code_challenge: String,
    pub authorisation_url: String,
}

/// Fields returned by the token endpoint.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

pub struct ReleaseRepository {
    conn: DatabaseConnection,
}

impl ReleaseRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Newest token that has not expired yet.
    pub async fn active_token(&self, now: DateTime<Utc>) -> Result<Option<myanimelist_tokens::Model>> {
        myanimelist_tokens::Entity::find()
            .filter(myanimelist_tokens::Column::ExpiredDate.gt(now))
            .filter(myanimelist_tokens::Column::AccessToken.is_not_null())
            .order_by_desc(myanimelist_tokens::Column::CreatedAt)
            .order_by_desc(myanimelist_tokens::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query active token")
    }

    pub async fn newest_token(&self) -> Result<Option<myanimelist_tokens::Model>> {
        myanimelist_tokens::Entity::find()
            .order_by_desc(myanimelist_tokens::Column::CreatedAt)
            .order_by_desc(myanimelist_tokens::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query newest token")
    }

    pub async fn create_token(&self, input: NewToken) -> Result<myanimelist_tokens::Model> {
        let now = Utc::now();
        myanimelist_tokens::ActiveModel {
            refresh_token: Set(None),
            access_token: Set(None),
            code_verifier: Set(input.code_verifier),
            code_challenge: Set(input.code_challenge),
            authorisation_url: Set(input.authorisation_url),
            expires_in: Set(None),
            expired_date: Set(None),
            token_type: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert token")
    }

    /// Stores an issued token; `expired_date` is derived from `expires_in`.
    pub async fn store_issued(
        &self,
        token: myanimelist_tokens::Model,
        issued: IssuedToken,
    ) -> Result<myanimelist_tokens::Model> {
        let now = Utc::now();
        let expired_date = issued
            .expires_in
            .map(|seconds| now + chrono::Duration::seconds(seconds));

        let mut active: myanimelist_tokens::ActiveModel = token.into();
        active.access_token = Set(Some(issued.access_token));
        active.refresh_token = Set(issued.refresh_token);
        active.expires_in = Set(issued.expires_in);
        active.expired_date = Set(expired_date);
        active.token_type = Set(issued.token_type);
        active.updated_at = Set(now);
        active.update(&self.conn).await.context("Failed to store issued token")
    }

    pub async fn record_update(
        &self,
        source: ReleaseSource,
        user_id: Option<i32>,
        content: serde_json::Value,
    ) -> Result<update_releases::Model> {
        update_releases::ActiveModel {
            source: Set(source),
            user_id: Set(user_id),
            content: Set(content),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert update release")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    fn pkce() -> NewToken {
        NewToken {
            code_verifier: "v".repeat(128),
            code_challenge: "v".repeat(128),
            authorisation_url: "https://myanimelist.net/v1/oauth2/authorize".into(),
        }
    }

    #[tokio::test]
    async fn only_issued_unexpired_tokens_are_active() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let repo = store.releases();

        let pending = repo.create_token(pkce()).await.unwrap();
        assert!(repo.active_token(Utc::now()).await.unwrap().is_none());
        assert_eq!(repo.newest_token().await.unwrap().unwrap().id, pending.id);

        let issued = repo
            .store_issued(
                pending,
                IssuedToken {
                    access_token: "access".into(),
                    refresh_token: Some("refresh".into()),
                    expires_in: Some(3600),
                    token_type: Some("Bearer".into()),
                },
            )
            .await
            .unwrap();

        let active = repo.active_token(Utc::now()).await.unwrap().unwrap();
        assert_eq!(active.id, issued.id);
        assert!(
            repo.active_token(Utc::now() + chrono::Duration::hours(2))
                .await
                .unwrap()
                .is_none()
        );
    }
}
