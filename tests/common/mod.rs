#![allow(dead_code)]

use std::sync::Arc;

use animeon::api::{self, AppState};
use animeon::config::Config;
use animeon::db::Store;
use animeon::db::repositories::user::NewUser;
use animeon::state::SharedState;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.server.media_root = std::env::temp_dir()
        .join(format!("animeon-test-{}", uuid::Uuid::new_v4().simple()))
        .to_string_lossy()
        .into_owned();
    config
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let store = Store::new(&config.general.database_path)
        .await
        .expect("Failed to open store");
    let shared = SharedState::with_store(config, store).expect("Failed to build state");
    let state = api::create_app_state(shared, None);
    TestApp {
        router: api::router(state.clone()),
        state,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    /// Registers a user and returns its access token.
    pub async fn register(&self, username: &str) -> String {
        let response = self
            .post(
                "/api/v1/auth/registration/",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "secret-pass",
                    "password_repeat": "secret-pass",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["access"].as_str().unwrap().to_string()
    }

    /// Creates a staff account and returns its access token.
    pub async fn staff(&self, username: &str) -> String {
        self.state
            .store()
            .users()
            .create(
                NewUser {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    password: "staff-pass".to_string(),
                    is_staff: true,
                    is_superuser: false,
                },
                &self.state.config().security,
            )
            .await
            .unwrap();

        let response = self
            .post(
                "/api/v1/auth/login/",
                None,
                json!({"username": username, "password": "staff-pass"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["access"].as_str().unwrap().to_string()
    }

    /// Creates an anime through the staff API and returns its id.
    pub async fn create_anime(&self, staff_token: &str, title: &str) -> i64 {
        let response = self
            .post(
                "/api/v1/staff/anime/",
                Some(staff_token),
                json!({
                    "title": title,
                    "type": "ANIME",
                    "rating": "PG13",
                    "status": "COMES_OUT",
                    "start_date": "2024-04-01",
                    "description": "A story",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().unwrap()
    }
}
