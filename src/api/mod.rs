use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod anime;
pub mod auth;
mod comments;
mod error;
pub mod extract;
mod observability;
pub mod pagination;
mod staff;
mod support;
pub mod types;
mod update_release;
mod users;
pub mod validation;
mod voiceovers;

pub use error::ApiError;
pub use observability::REQUEST_ID_HEADER;

#[derive(Clone)]
pub struct AppState {
    pub shared: SharedState,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        self.shared.config()
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

#[must_use]
pub fn create_app_state(
    shared: SharedState,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = SharedState::new(config).await?;
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let media_root = state.shared.media.root().to_path_buf();
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(anime_routes())
        .merge(comment_routes())
        .merge(voiceover_routes())
        .merge(support_routes())
        .merge(staff_routes())
        .route(
            "/update_release/callback/myanimelist/",
            get(update_release::myanimelist_callback),
        );

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api/v1", api_router)
        .route("/ping/", get(observability::ping))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .with_state(state)
        .nest_service("/media", ServeDir::new(media_root))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::request_middleware))
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/registration/", post(auth::registration))
        .route("/auth/login/", post(auth::login))
        .route("/auth/token/refresh/", post(auth::refresh))
        .route("/auth/logout/", post(auth::logout))
}

fn upload_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(extract::UPLOAD_BODY_LIMIT)
}

fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/me/", get(users::me))
        .route(
            "/user/me/avatar/",
            put(users::set_avatar).layer(upload_limit()),
        )
        .route(
            "/user/anime/",
            get(users::list_anime)
                .post(users::add_anime)
                .delete(users::remove_anime),
        )
        .route("/user/episode/viewed/", post(users::episode_viewed))
}

fn anime_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/anime/list/", get(anime::list_anime))
        .route("/anime/list/random/", get(anime::list_random))
        .route("/anime/random/", get(anime::random))
        .route("/anime/top/", get(anime::list_top))
        .route("/anime/search/", get(anime::search))
        .route("/anime/posters/", get(anime::posters))
        .route("/anime/filters/", get(anime::filters))
        .route("/anime/director/{pk}/", get(anime::director))
        .route("/anime/studio/{pk}/", get(anime::studio))
        .route("/anime/{pk}/{slug}/", get(anime::get_anime))
        .route("/anime/{pk}/{slug}/comments/", get(anime::get_comments))
        .route(
            "/anime/{pk}/{slug}/episode/{order}/",
            get(anime::get_episode),
        )
        .route("/anime/{pk}/{slug}/arch/", get(anime::get_arches))
        .route("/anime/{pk}/{slug}/reaction/", post(anime::react))
}

fn comment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/comment/", post(comments::create_comment))
        .route(
            "/comment/{key}/",
            axum::routing::patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/comment/{key}/replies/", get(comments::list_replies))
        .route("/comment/{key}/reaction/", post(comments::react))
}

fn voiceover_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/voiceover/", post(voiceovers::create_voiceover))
        .route("/voiceover/{id}/", get(voiceovers::get_voiceover))
}

fn support_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/support/rightholder/", post(support::create_rightholder))
        .route("/support/help/", post(support::create_help))
}

fn staff_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/staff/anime/", post(staff::create_anime))
        .route(
            "/staff/anime/{id}/",
            put(staff::update_anime).delete(staff::delete_anime),
        )
        .route(
            "/staff/anime/{id}/top/",
            post(staff::set_top).delete(staff::reset_top),
        )
        .route("/staff/anime/{id}/history/", get(staff::anime_history))
        .route(
            "/staff/anime/{id}/images/{slot}/",
            put(staff::upload_anime_image).layer(upload_limit()),
        )
        .route(
            "/staff/anime/{id}/poster/",
            put(staff::upload_poster).layer(upload_limit()),
        )
        .route("/staff/anime/{id}/episodes/", post(staff::create_episode))
        .route("/staff/anime/{id}/arches/", post(staff::create_arch))
        .route(
            "/staff/episodes/{id}/preview/",
            put(staff::upload_episode_preview).layer(upload_limit()),
        )
        .route("/staff/genres/", post(staff::create_genre))
        .route("/staff/studios/", post(staff::create_studio))
        .route("/staff/directors/", post(staff::create_director))
        .route("/staff/teams/", post(staff::create_team))
        .route("/staff/teams/{id}/members/", post(staff::add_team_member))
        .route("/staff/voiceovers/", get(voiceovers::list_voiceovers))
        .route("/staff/voiceovers/{id}/events/", post(voiceovers::add_event))
        .route("/staff/comments/{key}/pin/", post(comments::pin_comment))
        .route("/staff/appeals/{kind}/", get(support::list_appeals))
        .route("/staff/appeals/{kind}/assign/", post(support::bulk_assign))
        .route("/staff/appeals/{kind}/{id}/", get(support::get_appeal))
        .route("/staff/appeals/{kind}/{id}/assign/", post(support::assign))
        .route(
            "/staff/appeals/{kind}/{id}/unassign/",
            post(support::unassign),
        )
        .route("/staff/appeals/{kind}/{id}/resolve/", post(support::resolve))
        .route("/staff/appeals/{kind}/{id}/notes/", post(support::add_note))
}
