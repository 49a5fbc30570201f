use rand::Rng;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::MyAnimeListConfig;

const OAUTH_BASE: &str = "https://myanimelist.net/v1/";
const API_BASE: &str = "https://api.myanimelist.net/v2/";

const CODE_VERIFIER_LEN: usize = 128;
const URL_SAFE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

const ANIME_FIELDS: &[&str] = &[
    "id",
    "title",
    "main_picture",
    "alternative_titles",
    "start_date",
    "end_date",
    "synopsis",
    "mean",
    "rank",
    "popularity",
    "num_list_users",
    "num_scoring_users",
    "nsfw",
    "created_at",
    "updated_at",
    "media_type",
    "status",
    "genres",
    "my_list_status",
    "num_episodes",
    "start_season",
    "broadcast",
    "source",
    "average_episode_duration",
    "rating",
    "pictures",
    "background",
    "related_anime",
    "related_manga",
    "recommendations",
    "studios",
    "statistics",
];

pub const RANKING_TYPES: &[&str] = &[
    "all",
    "airing",
    "upcoming",
    "tv",
    "ova",
    "movie",
    "special",
    "bypopularity",
    "favorite",
];

pub const SEASONS: &[&str] = &["winter", "spring", "summer", "fall"];

pub const SEASONAL_SORTS: &[&str] = &["anime_score", "anime_num_list_users"];

#[derive(Debug, Error)]
pub enum MyAnimeListError {
    #[error("Error: {status}: {body}, {url}")]
    Api { status: u16, body: String, url: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Body of a successful `oauth2/token` call.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

#[derive(Clone)]
pub struct MyAnimeListClient {
    client: Client,
    client_id: String,
    client_secret: String,
    retry_delay: Duration,
    oauth_base: String,
    api_base: String,
}

impl MyAnimeListClient {
    pub fn new(config: &MyAnimeListConfig) -> Result<Self, MyAnimeListError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("Animeon/1.0")
            .build()?;

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            retry_delay: Duration::from_secs(config.retry_delay_seconds),
            oauth_base: OAUTH_BASE.to_string(),
            api_base: API_BASE.to_string(),
        })
    }

    /// Points the client at other hosts, e.g. a local stub.
    #[must_use]
    pub fn with_base_urls(mut self, oauth_base: &str, api_base: &str) -> Self {
        self.oauth_base = oauth_base.to_string();
        self.api_base = api_base.to_string();
        self
    }

    /// A fresh PKCE verifier. MyAnimeList only supports the `plain`
    /// challenge method, so the verifier doubles as the challenge.
    #[must_use]
    pub fn new_code_verifier() -> String {
        let mut rng = rand::rng();
        (0..CODE_VERIFIER_LEN)
            .map(|_| char::from(URL_SAFE[rng.random_range(0..URL_SAFE.len())]))
            .collect()
    }

    #[must_use]
    pub fn authorisation_url(&self, code_challenge: &str, state: &str) -> String {
        format!(
            "{}oauth2/authorize?state={}&response_type=code&client_id={}&code_challenge={}",
            self.oauth_base, state, self.client_id, code_challenge
        )
    }

    pub async fn generate_new_token(
        &self,
        authorisation_code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, MyAnimeListError> {
        let url = format!("{}oauth2/token", self.oauth_base);
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", authorisation_code),
            ("code_verifier", code_verifier),
            ("grant_type", "authorization_code"),
        ];

        info!(event = "myanimelist_generate_new_token", "Generating MyAnimeList token");
        let body = self.call(|| self.client.post(&url).form(&form)).await?;
        serde_json::from_value(body).map_err(|e| MyAnimeListError::Decode(e.to_string()))
    }

    pub async fn refresh_bearer_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, MyAnimeListError> {
        let url = format!("{}oauth2/token", self.oauth_base);
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if !self.client_secret.is_empty() {
            form.push(("client_secret", self.client_secret.as_str()));
        }

        info!(event = "myanimelist_refresh_bearer_token", "Refreshing MyAnimeList token");
        let body = self.call(|| self.client.post(&url).form(&form)).await?;
        serde_json::from_value(body).map_err(|e| MyAnimeListError::Decode(e.to_string()))
    }

    /// API handle authorised with a bearer token.
    #[must_use]
    pub fn connect<'a>(&'a self, access_token: &'a str) -> AnimeApi<'a> {
        AnimeApi {
            client: self,
            access_token,
        }
    }

    /// Sends the request, retrying once after a 429.
    async fn call<F>(&self, build: F) -> Result<Value, MyAnimeListError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut response = build().send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!(
                event = "myanimelist_rate_limited",
                url = %response.url(),
                delay_secs = self.retry_delay.as_secs(),
                "MyAnimeList rate limit hit, retrying once"
            );
            tokio::time::sleep(self.retry_delay).await;
            response = build().send().await?;
        }

        let status = response.status();
        let url = response.url().to_string();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(MyAnimeListError::Api {
                status: status.as_u16(),
                body,
                url,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| MyAnimeListError::Decode(format!("{e}, {url}")))
    }
}

pub struct AnimeApi<'a> {
    client: &'a MyAnimeListClient,
    access_token: &'a str,
}

impl AnimeApi<'_> {
    async fn get(&self, uri: &str, params: &[(&str, String)]) -> Result<Value, MyAnimeListError> {
        let url = format!("{}{}", self.client.api_base, uri);
        self.client
            .call(|| {
                self.client
                    .client
                    .get(&url)
                    .bearer_auth(self.access_token)
                    .query(params)
            })
            .await
    }

    pub async fn get_anime_details(&self, id: i64) -> Result<Value, MyAnimeListError> {
        info!(event = "myanimelist_get_anime_detail", anime_id = id, "Fetching anime details");
        self.get(&format!("anime/{id}"), &[("fields", ANIME_FIELDS.join(","))])
            .await
    }

    pub async fn search_anime(&self, keyword: &str, limit: u32) -> Result<Value, MyAnimeListError> {
        info!(event = "myanimelist_search_anime", keyword, "Searching anime");
        self.get(
            "anime",
            &[
                ("q", keyword.to_string()),
                ("fields", ANIME_FIELDS.join(",")),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    /// Unknown ranking types yield an empty object without a request.
    pub async fn get_anime_ranking(
        &self,
        ranking_type: &str,
        limit: u32,
    ) -> Result<Value, MyAnimeListError> {
        if !RANKING_TYPES.contains(&ranking_type) {
            info!(event = "myanimelist_get_anime_ranking", ranking_type, "Unknown ranking type");
            return Ok(Value::Object(serde_json::Map::new()));
        }

        self.get(
            "anime/ranking",
            &[
                ("ranking_type", ranking_type.to_string()),
                ("fields", ANIME_FIELDS.join(",")),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn get_seasonal_anime(
        &self,
        year: i32,
        season: &str,
        sort: &str,
        limit: u32,
    ) -> Result<Value, MyAnimeListError> {
        if !SEASONS.contains(&season) {
            info!(event = "myanimelist_get_seasonal_anime", season, "Unknown season");
            return Ok(Value::Object(serde_json::Map::new()));
        }
        if !SEASONAL_SORTS.contains(&sort) {
            info!(event = "myanimelist_get_seasonal_anime", sort, "Unknown sort");
            return Ok(Value::Object(serde_json::Map::new()));
        }

        self.get(
            &format!("anime/season/{year}/{season}"),
            &[
                ("sort", sort.to_string()),
                ("limit", limit.to_string()),
                ("fields", ANIME_FIELDS.join(",")),
            ],
        )
        .await
    }

    pub async fn get_suggested_anime(&self, limit: u32, offset: u32) -> Result<Value, MyAnimeListError> {
        self.get(
            "anime/suggestions",
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode as AxumStatus, routing::get};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config() -> MyAnimeListConfig {
        MyAnimeListConfig {
            client_id: "client".into(),
            client_secret: "secret".into(),
            request_timeout_seconds: 5,
            retry_delay_seconds: 0,
        }
    }

    async fn stub(first_status: AxumStatus) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/v2/anime",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        (first_status, Json(serde_json::json!({"error": "first"})))
                    } else {
                        (AxumStatus::OK, Json(serde_json::json!({"data": []})))
                    }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v2/"), hits)
    }

    #[test]
    fn code_verifier_is_url_safe() {
        let verifier = MyAnimeListClient::new_code_verifier();
        assert_eq!(verifier.len(), 128);
        assert!(
            verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn authorisation_url_shape() {
        let client = MyAnimeListClient::new(&config()).unwrap();
        assert_eq!(
            client.authorisation_url("abc", ""),
            "https://myanimelist.net/v1/oauth2/authorize?state=&response_type=code&client_id=client&code_challenge=abc"
        );
    }

    #[tokio::test]
    async fn unknown_ranking_is_empty() {
        let client = MyAnimeListClient::new(&config()).unwrap();
        let api = client.connect("token");
        let ranking = api.get_anime_ranking("weekly", 10).await.unwrap();
        assert_eq!(ranking, serde_json::json!({}));
        let seasonal = api.get_seasonal_anime(2024, "monsoon", "anime_score", 10).await.unwrap();
        assert_eq!(seasonal, serde_json::json!({}));
    }

    #[tokio::test]
    async fn rate_limit_is_retried_once() {
        let (api_base, hits) = stub(AxumStatus::TOO_MANY_REQUESTS).await;
        let client = MyAnimeListClient::new(&config())
            .unwrap()
            .with_base_urls("http://127.0.0.1:9/v1/", &api_base);

        let body = client.connect("token").search_anime("naruto", 20).await.unwrap();
        assert_eq!(body, serde_json::json!({"data": []}));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn query_parameters_and_bearer_are_sent() {
        let app = Router::new().route(
            "/v2/anime/suggestions",
            get(
                |axum::extract::RawQuery(query): axum::extract::RawQuery,
                 headers: axum::http::HeaderMap| async move {
                    Json(serde_json::json!({
                        "query": query,
                        "auth": headers.get("authorization").and_then(|h| h.to_str().ok()),
                    }))
                },
            ),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = MyAnimeListClient::new(&config())
            .unwrap()
            .with_base_urls("http://127.0.0.1:9/v1/", &format!("http://{addr}/v2/"));
        let body = client.connect("token").get_suggested_anime(5, 10).await.unwrap();
        assert_eq!(body["query"], "limit=5&offset=10");
        assert_eq!(body["auth"], "Bearer token");
    }

    #[tokio::test]
    async fn client_errors_surface_status_and_url() {
        let (api_base, hits) = stub(AxumStatus::FORBIDDEN).await;
        let client = MyAnimeListClient::new(&config())
            .unwrap()
            .with_base_urls("http://127.0.0.1:9/v1/", &api_base);

        let err = client.connect("token").search_anime("naruto", 20).await.unwrap_err();
        match err {
            MyAnimeListError::Api { status, url, .. } => {
                assert_eq!(status, 403);
                assert!(url.contains("/v2/anime"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
