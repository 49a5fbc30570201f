use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::entities::token_blacklist;

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn is_blacklisted(&self, jti: &str) -> Result<bool> {
        let count = token_blacklist::Entity::find()
            .filter(token_blacklist::Column::Jti.eq(jti))
            .count(&self.conn)
            .await
            .context("Failed to query token blacklist")?;

        Ok(count > 0)
    }

    /// Revokes a token. Revoking the same `jti` twice is a no-op.
    pub async fn blacklist(&self, jti: &str, user_id: i32, expires_at: DateTime<Utc>) -> Result<()> {
        if self.is_blacklisted(jti).await? {
            return Ok(());
        }

        token_blacklist::ActiveModel {
            jti: Set(jti.to_string()),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to blacklist token")?;

        Ok(())
    }

    /// Drops revocations whose tokens have expired anyway.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = token_blacklist::Entity::delete_many()
            .filter(token_blacklist::Column::ExpiresAt.lt(now))
            .exec(&self.conn)
            .await
            .context("Failed to prune token blacklist")?;

        Ok(result.rows_affected)
    }
}
