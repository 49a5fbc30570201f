use sea_orm::entity::prelude::*;

/// OAuth2 PKCE state and issued tokens for the MyAnimeList API.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "myanimelist_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub refresh_token: Option<String>,

    pub access_token: Option<String>,

    pub code_verifier: String,

    pub code_challenge: String,

    pub authorisation_url: String,

    /// Seconds, as reported by the token endpoint
    pub expires_in: Option<i64>,

    pub expired_date: Option<DateTimeUtc>,

    pub token_type: Option<String>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
