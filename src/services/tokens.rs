//! HS256 access and refresh tokens.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::db::repositories::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub token_type: TokenType,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i32, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Invalid)
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token is invalid or expired")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

pub struct IssuedPair {
    pub access: String,
    pub refresh: String,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(security: &SecurityConfig) -> Self {
        let secret = security.secret_key.as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_lifetime: Duration::minutes(security.access_token_lifetime_minutes),
            refresh_lifetime: Duration::minutes(security.refresh_token_lifetime_minutes),
        }
    }

    pub fn issue(&self, user: &User, token_type: TokenType) -> Result<String, TokenError> {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            token_type,
            jti: uuid::Uuid::new_v4().simple().to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn issue_pair(&self, user: &User) -> Result<IssuedPair, TokenError> {
        Ok(IssuedPair {
            access: self.issue(user, TokenType::Access)?,
            refresh: self.issue(user, TokenType::Refresh)?,
        })
    }

    /// Decodes a token and checks its signature, expiry and type.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)?;

        if claims.token_type != expected {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            username: "kaori".into(),
            email: "kaori@example.com".into(),
            avatar: None,
            is_staff: false,
            is_superuser: false,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn pair_round_trips_with_type_check() {
        let issuer = TokenIssuer::new(&SecurityConfig::default());
        let pair = issuer.issue_pair(&user()).unwrap();

        let access = issuer.verify(&pair.access, TokenType::Access).unwrap();
        assert_eq!(access.user_id().unwrap(), 7);
        assert_eq!(access.username, "kaori");

        assert!(issuer.verify(&pair.access, TokenType::Refresh).is_err());
        assert!(issuer.verify(&pair.refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let issuer = TokenIssuer::new(&SecurityConfig::default());
        let other = TokenIssuer::new(&SecurityConfig {
            secret_key: "another-key".into(),
            ..SecurityConfig::default()
        });
        let token = other.issue(&user(), TokenType::Access).unwrap();
        assert!(issuer.verify(&token, TokenType::Access).is_err());
    }

    #[test]
    fn expired_tokens_fail() {
        let issuer = TokenIssuer::new(&SecurityConfig {
            access_token_lifetime_minutes: -5,
            ..SecurityConfig::default()
        });
        let token = issuer.issue(&user(), TokenType::Access).unwrap();
        assert!(matches!(
            issuer.verify(&token, TokenType::Access),
            Err(TokenError::Invalid)
        ));
    }
}
