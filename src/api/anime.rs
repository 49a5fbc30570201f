use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::auth::AuthUser;
use super::extract::ApiJson;
use super::pagination::Pagination;
use super::{ApiError, AppState};
use crate::api::types::{
    AnimeCardDto, AnimeDetailDto, AnimeListQuery, ArchDto, CommentDto, DirectorDetailDto,
    EpisodeDetailDto, FiltersDto, Paginated, PosterDto, RandomAnimeDto, ReactionDto,
    ReactionRequest, SearchQuery, StudioDetailDto,
};
use crate::services::{AnimeListing, CatalogError};

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound => Self::not_found(),
            CatalogError::Validation(errors) => Self::Validation(errors),
            CatalogError::Database(msg) => Self::DatabaseError(msg),
            CatalogError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

/// GET /anime/{pk}/{slug}/
pub async fn get_anime(
    State(state): State<Arc<AppState>>,
    Path((id, _slug)): Path<(i32, String)>,
) -> Result<Json<AnimeDetailDto>, ApiError> {
    Ok(Json(state.shared.catalog_service.anime_detail(id).await?))
}

/// GET /anime/{pk}/{slug}/comments/
pub async fn get_comments(
    State(state): State<Arc<AppState>>,
    Path((id, _slug)): Path<(i32, String)>,
    pagination: Pagination,
) -> Result<Json<Paginated<CommentDto>>, ApiError> {
    let request = pagination.request(state.shared.config.catalog.comment_page_size)?;
    let page = state
        .shared
        .comment_service
        .list_for_anime(id, request)
        .await?;
    Ok(Json(pagination.respond(page)?))
}

/// GET /anime/{pk}/{slug}/episode/{order}/
pub async fn get_episode(
    State(state): State<Arc<AppState>>,
    Path((id, _slug, order)): Path<(i32, String, i32)>,
) -> Result<Json<EpisodeDetailDto>, ApiError> {
    Ok(Json(
        state.shared.catalog_service.episode_detail(id, order).await?,
    ))
}

/// GET /anime/{pk}/{slug}/arch/
pub async fn get_arches(
    State(state): State<Arc<AppState>>,
    Path((id, _slug)): Path<(i32, String)>,
) -> Result<Json<Vec<ArchDto>>, ApiError> {
    Ok(Json(state.shared.catalog_service.arches(id).await?))
}

/// POST /anime/{pk}/{slug}/reaction/
pub async fn react(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((id, _slug)): Path<(i32, String)>,
    ApiJson(payload): ApiJson<ReactionRequest>,
) -> Result<Json<ReactionDto>, ApiError> {
    Ok(Json(
        state
            .shared
            .catalog_service
            .react(user.id, id, payload)
            .await?,
    ))
}

async fn listing(
    state: &AppState,
    pagination: &Pagination,
    query: &AnimeListQuery,
    listing: AnimeListing,
) -> Result<Paginated<AnimeCardDto>, ApiError> {
    let request = pagination.request(state.shared.config.catalog.anime_page_size)?;
    let page = state
        .shared
        .catalog_service
        .list(query, listing, request)
        .await?;
    pagination.respond(page)
}

/// GET /anime/list/
pub async fn list_anime(
    State(state): State<Arc<AppState>>,
    pagination: Pagination,
    Query(query): Query<AnimeListQuery>,
) -> Result<Json<Paginated<AnimeCardDto>>, ApiError> {
    Ok(Json(
        listing(&state, &pagination, &query, AnimeListing::Newest).await?,
    ))
}

/// GET /anime/list/random/
pub async fn list_random(
    State(state): State<Arc<AppState>>,
    pagination: Pagination,
    Query(query): Query<AnimeListQuery>,
) -> Result<Json<Paginated<AnimeCardDto>>, ApiError> {
    Ok(Json(
        listing(&state, &pagination, &query, AnimeListing::Random).await?,
    ))
}

/// GET /anime/top/
pub async fn list_top(
    State(state): State<Arc<AppState>>,
    pagination: Pagination,
    Query(query): Query<AnimeListQuery>,
) -> Result<Json<Paginated<AnimeCardDto>>, ApiError> {
    Ok(Json(
        listing(&state, &pagination, &query, AnimeListing::Top).await?,
    ))
}

/// GET /anime/random/
pub async fn random(State(state): State<Arc<AppState>>) -> Result<Json<RandomAnimeDto>, ApiError> {
    Ok(Json(state.shared.catalog_service.random().await?))
}

/// GET /anime/search/?search=
pub async fn search(
    State(state): State<Arc<AppState>>,
    pagination: Pagination,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Paginated<AnimeCardDto>>, ApiError> {
    let request = pagination.request(state.shared.config.catalog.anime_page_size)?;
    let page = state
        .shared
        .catalog_service
        .search(query.search.as_deref(), request)
        .await?;
    Ok(Json(pagination.respond(page)?))
}

/// GET /anime/posters/
pub async fn posters(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PosterDto>>, ApiError> {
    Ok(Json(state.shared.catalog_service.posters().await?))
}

/// GET /anime/filters/
pub async fn filters(State(state): State<Arc<AppState>>) -> Result<Json<FiltersDto>, ApiError> {
    Ok(Json(state.shared.catalog_service.filters().await?))
}

/// GET /anime/director/{pk}/
pub async fn director(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<DirectorDetailDto>, ApiError> {
    Ok(Json(state.shared.catalog_service.director(id).await?))
}

/// GET /anime/studio/{pk}/
pub async fn studio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<StudioDetailDto>, ApiError> {
    Ok(Json(state.shared.catalog_service.studio(id).await?))
}
