use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{
    AnimeStatus, AnimeType, AppealEvent, AppealKind, AppealStatus, DayOfWeek, ReactionAction,
    ReactionCounts, Rating, Season, UserAnimeAction, VoiceoverEvent, VoiceoverStatus,
    VoiceoverType,
};

/// One entry of the error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl FieldError {
    pub fn at(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Some(location.into()),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Serialize)]
pub struct Empty {}

/// `?page=&page_size=` of paginated endpoints, parsed by the pagination helper.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Page-number pagination envelope.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub active_page: u64,
    pub num_pages: u64,
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

// ============================================================================
// Auth and users
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct RegistrationRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "password2")]
    pub password_repeat: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummaryDto {
    pub username: String,
    pub count_viewed_anime: u64,
    pub count_commented_anime: u64,
}

#[derive(Debug, Serialize)]
pub struct RegistrationDto {
    pub user: UserSummaryDto,
    pub refresh: String,
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPairDto {
    pub refresh: String,
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenDto {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct MeDto {
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub count_viewed_anime: u64,
    pub count_commented_anime: u64,
}

#[derive(Debug, Serialize)]
pub struct AvatarDto {
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct UserAnimeDto {
    pub id: i32,
    pub action: UserAnimeAction,
    pub anime: AnimeCardDto,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserAnimeRequest {
    pub action: Option<String>,
    pub anime: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct UserAnimeMarkDto {
    pub action: UserAnimeAction,
    pub anime: i32,
}

#[derive(Debug, Serialize)]
pub struct EpisodeViewedDto {
    pub episode: i32,
}

#[derive(Debug, Serialize)]
pub struct DeletedDto {
    pub deleted: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserAnimeQuery {
    pub action: Option<String>,
    pub genres: Option<String>,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EpisodeViewedRequest {
    pub episode: Option<i32>,
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GenreDto {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudioDto {
    pub id: i32,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectorRefDto {
    pub id: i32,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamDto {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeRefDto {
    pub id: i32,
    pub title: String,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleItemDto {
    pub title: String,
    pub order: i32,
    pub release_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimeRefDto {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub card_image: Option<String>,
}

/// Row of the anime lists.
#[derive(Debug, Clone, Serialize)]
pub struct AnimeCardDto {
    pub id: i32,
    pub slug: String,
    pub title: String,
    #[serde(rename = "type")]
    pub anime_type: AnimeType,
    pub status: AnimeStatus,
    pub rating: Rating,
    pub season: Season,
    pub year: i32,
    pub is_top: bool,
    pub card_image: Option<String>,
    pub genres: Vec<GenreDto>,
    pub count_episodes: u64,
}

#[derive(Debug, Serialize)]
pub struct AnimeDetailDto {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub other_title: Option<String>,
    pub description: String,
    #[serde(rename = "type")]
    pub anime_type: AnimeType,
    pub type_display: &'static str,
    pub status: AnimeStatus,
    pub status_display: &'static str,
    pub season: Season,
    pub season_display: &'static str,
    pub rating: Rating,
    pub rating_display: &'static str,
    pub release_day_of_week: Option<DayOfWeek>,
    pub average_time_episode: Option<i32>,
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub country: Option<String>,
    pub trailer_url: Option<String>,
    pub is_top: bool,
    pub card_image: Option<String>,
    pub background_image: Option<String>,
    pub preview_images: Vec<String>,
    pub genres: Vec<GenreDto>,
    pub director: Option<DirectorRefDto>,
    pub studios: Vec<StudioDto>,
    pub episodes: Vec<EpisodeRefDto>,
    pub release_schedule: Vec<ScheduleItemDto>,
    pub count_episodes: u64,
    pub voiceovers: Vec<TeamDto>,
    pub reactions: ReactionCounts,
    pub similar: Vec<AnimeRefDto>,
    pub related: Vec<AnimeRefDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceoverLinkDto {
    pub id: i32,
    pub url: String,
    pub team: TeamDto,
}

#[derive(Debug, Serialize)]
pub struct EpisodeDetailDto {
    pub id: i32,
    pub title: String,
    pub order: i32,
    pub release_date: Option<NaiveDate>,
    pub preview_image: Option<String>,
    pub start_opening: Option<i32>,
    pub end_opening: Option<i32>,
    pub start_ending: Option<i32>,
    pub end_ending: Option<i32>,
    pub voiceover: Vec<VoiceoverLinkDto>,
    pub subtitles: Vec<VoiceoverLinkDto>,
}

#[derive(Debug, Serialize)]
pub struct ArchDto {
    pub id: i32,
    pub title: String,
    pub order: i32,
    pub episodes: Vec<EpisodeRefDto>,
}

#[derive(Debug, Serialize)]
pub struct RandomAnimeDto {
    pub id: i32,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct PosterAnimeDto {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub count_episodes: u64,
}

#[derive(Debug, Serialize)]
pub struct PosterDto {
    pub anime: PosterAnimeDto,
    pub image: Option<String>,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct FiltersDto {
    pub directors: Vec<DirectorRefDto>,
    pub genres: Vec<GenreDto>,
    pub studios: Vec<GenreDto>,
    pub countries: BTreeMap<String, String>,
    pub voiceover: Vec<TeamDto>,
    pub status: BTreeMap<&'static str, &'static str>,
    #[serde(rename = "type")]
    pub anime_type: BTreeMap<&'static str, &'static str>,
    pub season: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
pub struct TitleDto {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct DirectorDetailDto {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub url: Option<String>,
    pub anime: Vec<TitleDto>,
}

#[derive(Debug, Serialize)]
pub struct StudioDetailDto {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub country: Option<String>,
    pub anime: Vec<TitleDto>,
}

/// Filters of `anime/list/`; every value arrives as text and is validated.
#[derive(Debug, Default, Deserialize)]
pub struct AnimeListQuery {
    pub genres: Option<String>,
    pub studio: Option<String>,
    pub country: Option<String>,
    pub status: Option<String>,
    pub director: Option<String>,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub voiceover: Option<String>,
    pub season: Option<String>,
    pub year_gte: Option<String>,
    pub year_lte: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReactionRequest {
    pub reaction: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReactionDto {
    pub action: ReactionAction,
}

// ============================================================================
// Staff catalog management
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AnimeWriteRequest {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub status: Option<String>,
    pub rating: Option<String>,
    pub season: Option<String>,
    pub description: Option<String>,
    pub other_title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub release_day_of_week: Option<String>,
    pub average_time_episode: Option<i32>,
    pub country: Option<String>,
    pub trailer_url: Option<String>,
    pub director: Option<i32>,
    #[serde(default)]
    pub genres: Vec<i32>,
    #[serde(default)]
    pub studios: Vec<i32>,
    #[serde(default)]
    pub related: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct TopStateDto {
    pub id: i32,
    pub is_top: bool,
}

#[derive(Debug, Serialize)]
pub struct AnimeHistoryDto {
    pub event: &'static str,
    pub message: String,
    pub user_id: Option<i32>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EpisodeWriteRequest {
    pub title: Option<String>,
    pub order: Option<i32>,
    pub arch: Option<i32>,
    pub status: Option<String>,
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_accessible: bool,
    pub start_opening: Option<i32>,
    pub end_opening: Option<i32>,
    pub start_ending: Option<i32>,
    pub end_ending: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct EpisodeDto {
    pub id: i32,
    pub anime: i32,
    pub arch: Option<i32>,
    pub title: String,
    pub order: i32,
    pub status: crate::domain::EpisodeStatus,
    pub release_date: Option<NaiveDate>,
    pub is_accessible: bool,
    pub preview_image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArchWriteRequest {
    pub title: Option<String>,
    pub order: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NameRequest {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StudioWriteRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DirectorWriteRequest {
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DirectorDto {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TeamMemberRequest {
    pub user: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ImageDto {
    pub image: String,
}

// ============================================================================
// Voiceovers
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct VoiceoverCreateRequest {
    pub episode: Option<i32>,
    pub team: Option<i32>,
    #[serde(rename = "type")]
    pub voiceover_type: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryEventRequest {
    pub event: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct VoiceoverHistoryDto {
    pub id: i32,
    pub event: VoiceoverEvent,
    pub message: String,
    pub status: Option<VoiceoverStatus>,
    pub user_id: Option<i32>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct VoiceoverDto {
    pub id: i32,
    #[serde(rename = "type")]
    pub voiceover_type: VoiceoverType,
    pub episode: i32,
    pub team: i32,
    pub user: Option<i32>,
    pub status: VoiceoverStatus,
    pub url: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<VoiceoverHistoryDto>>,
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CommentCreateRequest {
    pub content: Option<String>,
    pub object_id: Option<i32>,
    pub parent_id: Option<i32>,
    pub content_type: Option<String>,
    #[serde(default)]
    pub is_spoiler: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentUpdateRequest {
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PinRequest {
    #[serde(default = "pinned_by_default")]
    pub is_pinned: bool,
}

const fn pinned_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentDto {
    pub id: i32,
    pub urlhash: String,
    pub content: String,
    pub content_main: String,
    pub username: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub is_edited: bool,
    pub is_spoiler: bool,
    pub is_pinned: bool,
    pub has_reply: bool,
    pub count_like: u64,
    pub count_dislike: u64,
    pub parent: Option<i32>,
}

// ============================================================================
// Support
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct RightholderAppealRequest {
    pub organization: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub release_url: Option<serde_json::Value>,
    pub document_url: Option<serde_json::Value>,
    pub explanation: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HelpAppealRequest {
    pub title: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AppealHistoryDto {
    pub id: i32,
    pub event: AppealEvent,
    pub message: String,
    pub status: Option<AppealStatus>,
    pub user_id: Option<i32>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AppealDto {
    pub id: i32,
    pub kind: AppealKind,
    pub email: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_url: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub user: Option<i32>,
    pub assigned: Option<i32>,
    pub status: AppealStatus,
    pub created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<AppealHistoryDto>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoteRequest {
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkAssignRequest {
    #[serde(default)]
    pub ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct BulkAssignDto {
    pub assigned: u64,
    pub total: u64,
}

// ============================================================================
// Update release
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}
